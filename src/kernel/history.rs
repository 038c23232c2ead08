//! Rolling history of per-window peak amplitudes.
//!
//! # CONCURRENCY INVARIANT
//! The backing slots are only touched inside `append` and `snapshot`, both of
//! which hold the lock for a plain memory write or copy. Nothing performs I/O
//! or analysis while the lock is held.

use std::sync::{Arc, Mutex, MutexGuard};

use super::audio::segment::Sample;
use super::time::Timestamp;
use crate::error::ConfigError;

#[derive(Debug)]
struct Slots {
    samples: Vec<Option<Sample>>,
    pos: usize,
    written: u64,
}

/// Fixed-capacity circular store shared by the capture loop (sole writer)
/// and the query server (readers). Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct History {
    inner: Arc<Mutex<Slots>>,
    capacity: usize,
}

impl History {
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(Slots {
                samples: vec![None; capacity],
                pos: 0,
                written: 0,
            })),
            capacity,
        })
    }

    /// Capacity for `hours` of history when one sample is taken every
    /// `sample_period` seconds.
    pub fn for_duration(hours: f64, sample_period: f64) -> Result<Self, ConfigError> {
        if !(hours > 0.0 && hours.is_finite()) {
            return Err(ConfigError::NonPositive { name: "buffer_hours", value: hours });
        }
        if !(sample_period > 0.0 && sample_period.is_finite()) {
            return Err(ConfigError::NonPositive { name: "sample_time", value: sample_period });
        }
        Self::with_capacity((hours * 3600.0 / sample_period).round() as usize)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic elsewhere cannot leave the slots half-written: every critical
    // section is a single assignment or a clone.
    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, timestamp: Timestamp, amplitude: u16) {
        let mut slots = self.lock();
        let pos = slots.pos;
        slots.samples[pos] = Some(Sample::new(timestamp, amplitude));
        slots.pos = (pos + 1) % self.capacity;
        slots.written += 1;
    }

    /// Deep copy of the slots and cursor. The lock is released before return.
    pub fn snapshot(&self) -> HistorySnapshot {
        let slots = self.lock();
        HistorySnapshot {
            samples: slots.samples.clone(),
            pos: slots.pos,
            written: slots.written,
        }
    }
}

/// Point-in-time copy of a [`History`], in physical slot order.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    samples: Vec<Option<Sample>>,
    pos: usize,
    written: u64,
}

impl HistorySnapshot {
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Total appends ever observed, including overwritten ones.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn len(&self) -> usize {
        self.samples.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }

    /// Oldest to newest, rotated at the captured cursor, unwritten slots dropped.
    pub fn into_chronological(self) -> Vec<Sample> {
        let mut samples = self.samples;
        samples.rotate_left(self.pos);
        samples.into_iter().flatten().collect()
    }
}
