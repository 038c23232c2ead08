//! Fan-out of query results to any number of viewers.
//!
//! Rendering is left to whoever holds a subscription; this layer only polls
//! the audio server and distributes frames.

pub mod broadcaster;
pub mod poller;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::kernel::time::{self, format_clock, format_date};
use crate::server::protocol::QueryResponse;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardFrame {
    #[serde(flatten)]
    pub response: QueryResponse,
    pub date_current: String,
    pub time_current: String,
}

impl DashboardFrame {
    pub fn stamped(response: QueryResponse) -> Self {
        let now = time::now();
        Self {
            response,
            date_current: format_date(now, &Local),
            time_current: format_clock(now, &Local),
        }
    }
}
