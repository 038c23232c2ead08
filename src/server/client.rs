use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use super::protocol::{self, QueryReply, QueryRequest, QueryResponse};
use crate::error::ProtocolError;

#[derive(Debug, Clone)]
pub struct QueryClient {
    addr: String,
    timeout: Duration,
}

impl QueryClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Connect, send one request, wait for the reply. The whole exchange is
    /// bounded by the client timeout.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, ProtocolError> {
        timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| ProtocolError::Timeout(self.timeout))?
    }

    async fn exchange(&self, request: &QueryRequest) -> Result<QueryResponse, ProtocolError> {
        let stream = TcpStream::connect(self.addr.as_str()).await?;
        let mut framed = protocol::framed(stream);
        protocol::write_message(&mut framed, request).await?;
        let reply: QueryReply = protocol::read_message(&mut framed).await?;
        reply.into_result()
    }
}
