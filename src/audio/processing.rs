use tracing::{debug, error, info};

use super::capture::SampleSource;
use crate::error::CaptureError;
use crate::kernel::audio::segment::Sample;
use crate::kernel::history::History;
use crate::kernel::time;

/// Largest absolute sample value in the window. `i16::MIN` maps to 32768.
pub fn peak_amplitude(window: &[i16]) -> u16 {
    window.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0)
}

/// Sole writer of the history: one window in, one peak sample out.
pub struct CaptureLoop<S>
where
    S: SampleSource,
{
    source: S,
    history: History,
    window: Vec<i16>,
}

impl<S> CaptureLoop<S>
where
    S: SampleSource,
{
    pub fn new(source: S, history: History, window_samples: usize) -> Self {
        Self {
            source,
            history,
            window: vec![0; window_samples.max(1)],
        }
    }

    /// Capture one window and append its peak.
    pub fn step(&mut self) -> Result<Sample, CaptureError> {
        // 1. Block on the device
        self.source.read_window(&mut self.window)?;

        // 2. Reduce; the timestamp marks when the window finished
        let sample = Sample::new(time::now(), peak_amplitude(&self.window));

        // 3. Publish
        self.history.append(sample.timestamp, sample.amplitude);
        debug!(amplitude = sample.amplitude, "captured window");
        Ok(sample)
    }

    /// Runs until the source fails. Only ever returns an error.
    pub fn run(mut self) -> Result<(), CaptureError> {
        info!(
            "Capture Loop Started. Window: {} samples, History: {} slots",
            self.window.len(),
            self.history.capacity()
        );

        loop {
            if let Err(e) = self.step() {
                error!("Capture Loop stopped: {}", e);
                return Err(e);
            }
        }
    }
}
