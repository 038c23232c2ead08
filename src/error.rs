use std::time::Duration;
use thiserror::Error;

/// Failures of the capture input. Every variant is fatal to the capture loop.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device available")]
    NoDevice,
    #[error("no input device matching '{0}'")]
    DeviceNotFound(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("input device error: {0}")]
    Device(String),
    #[error("input stream error: {0}")]
    Stream(String),
    #[error("no audio received for {waited:?}")]
    Stalled { waited: Duration },
    #[error("input source closed")]
    Closed,
}

/// Errors on the query channel, either side.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("connection closed before a message arrived")]
    ConnectionClosed,
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("server rejected request: {0}")]
    Remote(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("history capacity must be at least one sample")]
    ZeroCapacity,
    #[error("'{name}' must be a positive number (got {value})")]
    NonPositive { name: &'static str, value: f64 },
}
