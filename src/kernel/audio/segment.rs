use super::super::time::{format_duration, Timestamp};
use serde::{Deserialize, Serialize};

/// One captured window reduced to its peak amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: Timestamp,
    pub amplitude: u16,
}

impl Sample {
    pub fn new(timestamp: Timestamp, amplitude: u16) -> Self {
        Self { timestamp, amplitude }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseInterval {
    pub start: Timestamp,
    pub stop: Timestamp,
    pub duration: String,
}

impl NoiseInterval {
    pub fn new(start: Timestamp, stop: Timestamp) -> Self {
        Self {
            start,
            stop,
            duration: format_duration(stop - start),
        }
    }

    pub fn length(&self) -> f64 {
        self.stop - self.start
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Noise,
    Quiet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentState {
    pub kind: StateKind,
    pub since: Timestamp,
}

impl CurrentState {
    pub fn quiet(since: Timestamp) -> Self {
        Self { kind: StateKind::Quiet, since }
    }

    pub fn noise(since: Timestamp) -> Self {
        Self { kind: StateKind::Noise, since }
    }

    /// Seconds spent in this state as of `now`. Never negative.
    pub fn elapsed(&self, now: Timestamp) -> f64 {
        (now - self.since).max(0.0)
    }
}

/// Output of one segmentation pass over a history snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub plot: Vec<f64>,
    pub noise_intervals: Vec<NoiseInterval>,
    pub current_state: CurrentState,
    pub computed_at: Timestamp,
}
