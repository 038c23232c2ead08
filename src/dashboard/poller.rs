use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::warn;

use super::broadcaster::Broadcaster;
use super::DashboardFrame;
use crate::error::ProtocolError;
use crate::server::client::QueryClient;
use crate::server::protocol::QueryRequest;

/// Queries the audio server on a fixed cadence and publishes each result.
pub struct Poller {
    client: QueryClient,
    request: QueryRequest,
    broadcaster: Broadcaster,
    cadence: Duration,
}

impl Poller {
    pub fn new(client: QueryClient, request: QueryRequest, broadcaster: Broadcaster, cadence: Duration) -> Self {
        Self {
            client,
            request,
            broadcaster,
            cadence,
        }
    }

    /// One poll cycle. Returns the number of subscribers reached.
    pub async fn poll_once(&self) -> Result<usize, ProtocolError> {
        let response = self.client.query(&self.request).await?;
        Ok(self.broadcaster.publish(DashboardFrame::stamped(response)))
    }

    pub async fn run(self) {
        let mut cadence = interval(self.cadence);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            cadence.tick().await;
            if let Err(e) = self.poll_once().await {
                warn!(server = self.client.addr(), "poll failed: {}", e);
            }
        }
    }
}
