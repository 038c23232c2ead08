//! Query wire protocol.
//!
//! One frame per message: a 4-byte big-endian length followed by a JSON body.
//! A connection carries exactly one request and one reply.

use bytes::Bytes;
use chrono::{Local, TimeZone};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::ProtocolError;
use crate::kernel::audio::monitor::AnalysisParameters;
use crate::kernel::audio::segment::{Analysis, StateKind};
use crate::kernel::time::{format_clock, format_duration};

pub const MAX_FRAME_BYTES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub upper_limit: f64,
    pub noise_threshold: f64,
    pub min_quiet_time: f64,
    pub min_noise_time: f64,
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::InvalidParameter { name, reason: reason.into() }
}

impl QueryRequest {
    pub fn validate(&self) -> Result<AnalysisParameters, ProtocolError> {
        let positive = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(value)
            } else {
                Err(invalid(name, format!("must be a positive number, got {}", value)))
            }
        };

        let normalization_ceiling = positive("upper_limit", self.upper_limit)?;
        let min_quiet_time = positive("min_quiet_time", self.min_quiet_time)?;
        let min_noise_time = positive("min_noise_time", self.min_noise_time)?;
        if !(self.noise_threshold > 0.0 && self.noise_threshold < 1.0) {
            return Err(invalid(
                "noise_threshold",
                format!("must lie strictly between 0 and 1, got {}", self.noise_threshold),
            ));
        }

        Ok(AnalysisParameters {
            normalization_ceiling,
            noise_threshold: self.noise_threshold,
            min_quiet_time,
            min_noise_time,
        })
    }
}

impl From<AnalysisParameters> for QueryRequest {
    fn from(params: AnalysisParameters) -> Self {
        Self {
            upper_limit: params.normalization_ceiling,
            noise_threshold: params.noise_threshold,
            min_quiet_time: params.min_quiet_time,
            min_noise_time: params.min_noise_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryingBlock {
    pub start: f64,
    pub start_str: String,
    pub stop: f64,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub audio_plot: Vec<f64>,
    pub crying_blocks: Vec<CryingBlock>,
    pub time_crying: String,
    pub time_quiet: String,
}

impl QueryResponse {
    /// Clock strings in the server's local time zone.
    pub fn from_analysis(analysis: &Analysis) -> Self {
        Self::from_analysis_in(analysis, &Local)
    }

    pub fn from_analysis_in<Tz>(analysis: &Analysis, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let crying_blocks = analysis
            .noise_intervals
            .iter()
            .map(|block| CryingBlock {
                start: block.start,
                start_str: format_clock(block.start, tz),
                stop: block.stop,
                duration: block.duration.clone(),
            })
            .collect();

        let state = analysis.current_state;
        let elapsed = format_duration(state.elapsed(analysis.computed_at));
        let (time_crying, time_quiet) = match state.kind {
            StateKind::Noise => (format!("Baby noise for {}", elapsed), String::new()),
            StateKind::Quiet => (String::new(), format!("Baby quiet for {}", elapsed)),
        };

        Self {
            audio_plot: analysis.plot.clone(),
            crying_blocks,
            time_crying,
            time_quiet,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReply {
    pub error: String,
}

/// What the server sends back: the result, or why the request was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryReply {
    Ok(QueryResponse),
    Err(ErrorReply),
}

impl QueryReply {
    pub fn error(message: impl Into<String>) -> Self {
        QueryReply::Err(ErrorReply { error: message.into() })
    }

    pub fn into_result(self) -> Result<QueryResponse, ProtocolError> {
        match self {
            QueryReply::Ok(response) => Ok(response),
            QueryReply::Err(ErrorReply { error }) => Err(ProtocolError::Remote(error)),
        }
    }
}

pub fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(MAX_FRAME_BYTES)
        .new_codec()
}

pub fn framed<T>(io: T) -> Framed<T, LengthDelimitedCodec>
where
    T: AsyncRead + AsyncWrite,
{
    Framed::new(io, codec())
}

pub async fn read_message<T, M>(framed: &mut Framed<T, LengthDelimitedCodec>) -> Result<M, ProtocolError>
where
    T: AsyncRead + AsyncWrite + Unpin,
    M: DeserializeOwned,
{
    match framed.next().await {
        Some(Ok(frame)) => Ok(serde_json::from_slice(&frame)?),
        Some(Err(e)) => Err(e.into()),
        None => Err(ProtocolError::ConnectionClosed),
    }
}

pub async fn write_message<T, M>(framed: &mut Framed<T, LengthDelimitedCodec>, message: &M) -> Result<(), ProtocolError>
where
    T: AsyncRead + AsyncWrite + Unpin,
    M: Serialize,
{
    let body = serde_json::to_vec(message)?;
    framed.send(Bytes::from(body)).await?;
    Ok(())
}
