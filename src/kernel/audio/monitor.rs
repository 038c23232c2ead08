use super::filter::{gaussian_smooth, resample_linear};
use super::segment::{Analysis, CurrentState, NoiseInterval, Sample};
use crate::kernel::time::Timestamp;

/// Per-query tuning, supplied fresh by every request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisParameters {
    /// Amplitude that maps to 1.0. Louder samples exceed 1.0 and are kept as is.
    pub normalization_ceiling: f64,
    /// Normalised level separating loud from quiet.
    pub noise_threshold: f64,
    /// Quiet gaps shorter than this (seconds) are folded into the surrounding noise.
    pub min_quiet_time: f64,
    /// Noise blocks shorter than this (seconds) are dropped as transients.
    pub min_noise_time: f64,
}

/// Server-side settings that depend on how the history was captured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub sample_period: f64,
    /// Gaussian sigma in seconds; 0 disables smoothing.
    pub smoothing_sigma_seconds: f64,
    pub plot_points: usize,
    pub plot_window_seconds: f64,
}

impl EngineSettings {
    pub fn new(sample_period: f64) -> Self {
        Self {
            sample_period,
            smoothing_sigma_seconds: 1.0,
            plot_points: 3600,
            plot_window_seconds: 3600.0,
        }
    }

    fn sigma_samples(&self) -> f64 {
        if self.sample_period > 0.0 {
            self.smoothing_sigma_seconds / self.sample_period
        } else {
            0.0
        }
    }

    fn plot_window_samples(&self) -> usize {
        if self.sample_period > 0.0 {
            ((self.plot_window_seconds / self.sample_period).round() as usize).max(1)
        } else {
            1
        }
    }
}

/// Loud/quiet masks. A value exactly on the threshold is in neither.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub loud: Vec<bool>,
    pub quiet: Vec<bool>,
}

/// Turns the amplitude history into merged noise blocks and a current state.
/// Stateless: every call works only from its arguments.
#[derive(Debug, Clone)]
pub struct NoiseMonitor {
    settings: EngineSettings,
}

impl NoiseMonitor {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// `samples` must be chronological with unwritten slots removed.
    pub fn analyze(&self, samples: &[Sample], params: &AnalysisParameters, now: Timestamp) -> Analysis {
        let timestamps: Vec<Timestamp> = samples.iter().map(|s| s.timestamp).collect();

        // 1. Normalize + smooth
        let levels = gaussian_smooth(
            &normalize(samples, params.normalization_ceiling),
            self.settings.sigma_samples(),
        );

        // 2. Plot series over the last hour
        let plot = self.plot_series(&levels);

        // 3. Classify, fold short silences, extract blocks
        let Classification { mut loud, quiet } = classify(&levels, params.noise_threshold);
        merge_short_silences(&mut loud, &quiet, &timestamps, params.min_quiet_time);
        let noise_intervals = extract_noise_blocks(&loud, &timestamps, params.min_noise_time);

        // 4. Hysteresis on the most recent block
        let current_state = current_state(&noise_intervals, &timestamps, now, params.min_quiet_time);

        Analysis {
            plot,
            noise_intervals,
            current_state,
            computed_at: now,
        }
    }

    fn plot_series(&self, levels: &[f64]) -> Vec<f64> {
        let window = self.settings.plot_window_samples();
        let tail = &levels[levels.len().saturating_sub(window)..];
        let mut padded = vec![0.0; window - tail.len()];
        padded.extend_from_slice(tail);
        resample_linear(&padded, self.settings.plot_points)
    }
}

pub fn normalize(samples: &[Sample], ceiling: f64) -> Vec<f64> {
    samples
        .iter()
        .map(|s| f64::from(s.amplitude) / ceiling)
        .collect()
}

pub fn classify(levels: &[f64], threshold: f64) -> Classification {
    Classification {
        loud: levels.iter().map(|&v| v > threshold).collect(),
        quiet: levels.iter().map(|&v| v < threshold).collect(),
    }
}

/// Maximal runs of `true`, as inclusive `(start, end)` index pairs.
pub fn runs(mask: &[bool]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, &set) in mask.iter().enumerate() {
        match (set, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                out.push((s, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, mask.len() - 1));
    }
    out
}

/// Marks every quiet run shorter than `min_quiet_time` as loud, except a run
/// starting at index 0. A run ending at the last index is still merged.
pub fn merge_short_silences(
    loud: &mut [bool],
    quiet: &[bool],
    timestamps: &[Timestamp],
    min_quiet_time: f64,
) {
    for (start, end) in runs(quiet) {
        if start == 0 {
            continue;
        }
        if timestamps[end] - timestamps[start] < min_quiet_time {
            for flag in &mut loud[start..=end] {
                *flag = true;
            }
        }
    }
}

pub fn extract_noise_blocks(
    loud: &[bool],
    timestamps: &[Timestamp],
    min_noise_time: f64,
) -> Vec<NoiseInterval> {
    runs(loud)
        .into_iter()
        .map(|(start, end)| NoiseInterval::new(timestamps[start], timestamps[end]))
        .filter(|block| block.length() >= min_noise_time)
        .collect()
}

pub fn current_state(
    blocks: &[NoiseInterval],
    timestamps: &[Timestamp],
    now: Timestamp,
    min_quiet_time: f64,
) -> CurrentState {
    match blocks.last() {
        None => CurrentState::quiet(timestamps.first().copied().unwrap_or(now)),
        Some(last) if now - last.stop < min_quiet_time => CurrentState::noise(last.start),
        Some(last) => CurrentState::quiet(last.stop),
    }
}
