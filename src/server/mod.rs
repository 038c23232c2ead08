pub mod client;
pub mod protocol;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::error::ProtocolError;
use crate::kernel::audio::monitor::{AnalysisParameters, NoiseMonitor};
use crate::kernel::history::History;
use crate::kernel::time;
use protocol::{QueryReply, QueryRequest, QueryResponse};

/// Answers one request per connection, one connection at a time.
pub struct QueryServer {
    listener: TcpListener,
    history: History,
    monitor: Arc<NoiseMonitor>,
    io_timeout: Duration,
}

impl QueryServer {
    pub async fn bind<A>(addr: A, history: History, monitor: NoiseMonitor, io_timeout: Duration) -> io::Result<Self>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            history,
            monitor: Arc::new(monitor),
            io_timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves forever. Failures are contained to the connection they happen on.
    pub async fn run(self) {
        match self.local_addr() {
            Ok(addr) => info!(%addr, "Query Server listening"),
            Err(e) => warn!("Query Server listening on unknown address: {}", e),
        }

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            match self.handle(stream).await {
                Ok(()) => debug!(%peer, "query served"),
                Err(e) => warn!(%peer, "query dropped: {}", e),
            }
        }
    }

    async fn handle(&self, stream: TcpStream) -> Result<(), ProtocolError> {
        let mut framed = protocol::framed(stream);

        // 1. Receive (bounded)
        let request = timeout(self.io_timeout, protocol::read_message::<_, QueryRequest>(&mut framed))
            .await
            .map_err(|_| ProtocolError::Timeout(self.io_timeout))?;

        // 2. Validate, snapshot, analyze
        let reply = match request.and_then(|r| r.validate()) {
            Ok(params) => answer(&self.history, &self.monitor, params).await,
            Err(e @ (ProtocolError::Json(_) | ProtocolError::InvalidParameter { .. })) => {
                warn!("rejecting request: {}", e);
                QueryReply::error(e.to_string())
            }
            Err(e) => return Err(e),
        };

        // 3. Reply (bounded). Dropping `framed` closes the connection.
        timeout(self.io_timeout, protocol::write_message(&mut framed, &reply))
            .await
            .map_err(|_| ProtocolError::Timeout(self.io_timeout))??;
        Ok(())
    }
}

/// Snapshot the history, release it, and run the segmentation off the
/// async workers.
pub async fn answer(history: &History, monitor: &Arc<NoiseMonitor>, params: AnalysisParameters) -> QueryReply {
    let snapshot = history.snapshot();
    let monitor = Arc::clone(monitor);
    let now = time::now();

    let analysis = tokio::task::spawn_blocking(move || {
        monitor.analyze(&snapshot.into_chronological(), &params, now)
    })
    .await;

    match analysis {
        Ok(analysis) => QueryReply::Ok(QueryResponse::from_analysis(&analysis)),
        Err(e) => {
            error!("analysis task failed: {}", e);
            QueryReply::error("analysis failed")
        }
    }
}
