pub mod audio;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod kernel;
pub mod server;

// Convenience re-exports
pub use kernel::audio::monitor::{AnalysisParameters, EngineSettings, NoiseMonitor};
pub use kernel::history::History;
pub use server::QueryServer;
