//! Command-line configuration for the audio server and the dashboard feed.

use std::time::Duration;

use clap::Parser;

use crate::audio::capture::CaptureSettings;
use crate::error::ConfigError;
use crate::kernel::audio::monitor::EngineSettings;
use crate::server::protocol::QueryRequest;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:6000";

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

/// Samples the microphone and answers history queries.
#[derive(Debug, Parser, Clone)]
#[command(name = "nightwatch", about = "Ambient noise history server", version)]
pub struct ServerConfig {
    /// Address the query server binds to
    #[arg(long, env = "NIGHTWATCH_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Hours of history kept in memory
    #[arg(long, env = "NIGHTWATCH_BUFFER_HOURS", default_value_t = 12.0)]
    pub buffer_hours: f64,

    /// Seconds of audio reduced to one history sample
    #[arg(long, env = "NIGHTWATCH_SAMPLE_TIME", default_value_t = 0.9)]
    pub sample_time: f64,

    /// Capture sample rate (Hz)
    #[arg(long, env = "NIGHTWATCH_SAMPLE_RATE", default_value_t = 44_100)]
    pub sample_rate: u32,

    /// Gaussian smoothing width (seconds); 0 disables smoothing
    #[arg(long, default_value_t = 1.0)]
    pub smoothing_seconds: f64,

    /// Per-connection timeout for reading the request and writing the reply
    #[arg(long, default_value_t = 2_000)]
    pub io_timeout_ms: u64,

    /// Preferred audio input device name (substring match)
    #[arg(long, env = "NIGHTWATCH_DEVICE")]
    pub device: Option<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("buffer_hours", self.buffer_hours)?;
        positive("sample_time", self.sample_time)?;
        positive("sample_rate", f64::from(self.sample_rate))?;
        positive("io_timeout_ms", self.io_timeout_ms as f64)?;
        if !(self.smoothing_seconds >= 0.0 && self.smoothing_seconds.is_finite()) {
            return Err(ConfigError::NonPositive {
                name: "smoothing_seconds",
                value: self.smoothing_seconds,
            });
        }
        if self.window_samples() == 0 {
            return Err(ConfigError::NonPositive { name: "sample_time", value: self.sample_time });
        }
        Ok(())
    }

    pub fn window_samples(&self) -> usize {
        (f64::from(self.sample_rate) * self.sample_time).round() as usize
    }

    pub fn capture(&self) -> CaptureSettings {
        CaptureSettings {
            sample_rate: self.sample_rate,
            window_samples: self.window_samples(),
            device: self.device.clone(),
        }
    }

    pub fn engine(&self) -> EngineSettings {
        EngineSettings {
            smoothing_sigma_seconds: self.smoothing_seconds,
            ..EngineSettings::new(self.sample_time)
        }
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Polls the audio server and prints every result as a JSON line.
#[derive(Debug, Parser, Clone)]
#[command(name = "nightwatch-feed", about = "Dashboard feed for the noise history server", version)]
pub struct FeedConfig {
    /// Address of the audio (query) server
    #[arg(long, env = "NIGHTWATCH_AUDIO_SERVER", default_value = DEFAULT_LISTEN)]
    pub audio_server: String,

    /// Poll cadence (milliseconds)
    #[arg(long, default_value_t = 1_000)]
    pub interval_ms: u64,

    /// Timeout for one query round trip (milliseconds)
    #[arg(long, default_value_t = 2_000)]
    pub timeout_ms: u64,

    /// Amplitude that maps to a normalised level of 1.0
    #[arg(long, default_value_t = 25_000.0)]
    pub upper_limit: f64,

    /// Normalised level above which a sample counts as noise
    #[arg(long, default_value_t = 0.25)]
    pub noise_threshold: f64,

    /// Quiet gaps shorter than this (seconds) are merged into noise
    #[arg(long, default_value_t = 30.0)]
    pub min_quiet_time: f64,

    /// Noise shorter than this (seconds) is ignored
    #[arg(long, default_value_t = 5.0)]
    pub min_noise_time: f64,
}

impl FeedConfig {
    pub fn request(&self) -> QueryRequest {
        QueryRequest {
            upper_limit: self.upper_limit,
            noise_threshold: self.noise_threshold,
            min_quiet_time: self.min_quiet_time,
            min_noise_time: self.min_noise_time,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_defaults_follow_capture_constants() {
        let config = ServerConfig::parse_from(["nightwatch"]);
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.window_samples(), 39_690);
        assert!(config.validate().is_ok());
        assert_eq!(config.engine().sample_period, 0.9);
    }

    #[test]
    fn server_rejects_non_positive_sample_time() {
        let config = ServerConfig::parse_from(["nightwatch", "--sample-time", "0"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "sample_time", .. })
        ));
    }

    #[test]
    fn feed_arguments_build_request() {
        let config = FeedConfig::parse_from([
            "nightwatch-feed",
            "--upper-limit",
            "30000",
            "--noise-threshold",
            "0.4",
            "--min-quiet-time",
            "60",
        ]);
        let request = config.request();
        assert_eq!(request.upper_limit, 30_000.0);
        assert_eq!(request.noise_threshold, 0.4);
        assert_eq!(request.min_quiet_time, 60.0);
        assert_eq!(request.min_noise_time, 5.0);
        assert!(request.validate().is_ok());
    }
}
