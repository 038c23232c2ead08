use std::collections::VecDeque;

use nightwatch::audio::capture::SampleSource;
use nightwatch::audio::processing::{peak_amplitude, CaptureLoop};
use nightwatch::error::CaptureError;
use nightwatch::kernel::history::History;
use nightwatch::kernel::time;

/// Plays back canned windows, then fails like an unplugged device.
struct ScriptedSource {
    windows: VecDeque<Vec<i16>>,
}

impl ScriptedSource {
    fn new(windows: Vec<Vec<i16>>) -> Self {
        Self {
            windows: windows.into(),
        }
    }
}

impl SampleSource for ScriptedSource {
    fn read_window(&mut self, window: &mut [i16]) -> Result<(), CaptureError> {
        let next = self.windows.pop_front().ok_or(CaptureError::Closed)?;
        window.fill(0);
        let n = next.len().min(window.len());
        window[..n].copy_from_slice(&next[..n]);
        Ok(())
    }
}

#[test]
fn test_peak_amplitude_is_max_absolute_value() {
    assert_eq!(peak_amplitude(&[]), 0);
    assert_eq!(peak_amplitude(&[3, -7, 5]), 7);
    assert_eq!(peak_amplitude(&[i16::MAX, 0]), 32_767);
    assert_eq!(peak_amplitude(&[i16::MIN, 100]), 32_768);
}

#[test]
fn test_step_appends_one_sample_per_window() {
    let history = History::with_capacity(16).unwrap();
    let source = ScriptedSource::new(vec![vec![1, -200, 3, 4], vec![10, 20, -30, 40]]);
    let mut capture = CaptureLoop::new(source, history.clone(), 4);

    let before = time::now();
    let first = capture.step().unwrap();
    let second = capture.step().unwrap();

    assert_eq!(first.amplitude, 200);
    assert_eq!(second.amplitude, 40);
    assert!(first.timestamp >= before);
    assert!(second.timestamp >= first.timestamp);

    let samples = history.snapshot().into_chronological();
    assert_eq!(samples, vec![first, second]);
}

#[test]
fn test_run_stops_on_source_failure() {
    let history = History::with_capacity(16).unwrap();
    let windows = (1..=5).map(|i| vec![i * 100; 8]).collect();
    let capture = CaptureLoop::new(ScriptedSource::new(windows), history.clone(), 8);

    let result = capture.run();
    assert!(matches!(result, Err(CaptureError::Closed)));

    // Nothing is invented for the failed read
    let amplitudes: Vec<u16> = history
        .snapshot()
        .into_chronological()
        .iter()
        .map(|s| s.amplitude)
        .collect();
    assert_eq!(amplitudes, vec![100, 200, 300, 400, 500]);
}

#[test]
fn test_capture_wraps_history() {
    let history = History::with_capacity(3).unwrap();
    let windows = (1..=7).map(|i| vec![i; 2]).collect();
    let _ = CaptureLoop::new(ScriptedSource::new(windows), history.clone(), 2).run();

    let samples = history.snapshot().into_chronological();
    let amplitudes: Vec<u16> = samples.iter().map(|s| s.amplitude).collect();
    assert_eq!(amplitudes, vec![5, 6, 7]);
    assert!(samples.windows(2).all(|w| w[1].timestamp >= w[0].timestamp));
}
