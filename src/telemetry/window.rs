//! Bounded sample windows backing the aggregator's statistics.
//!
//! [`BoundedWindow`] keeps the most recent N latency samples in insertion
//! order, evicting the oldest once capacity is exceeded. Percentile reads
//! take a sorted copy at read time — the window itself stays
//! insertion-ordered so eviction removes the oldest sample, not the
//! smallest.
//!
//! [`TimestampLog`] is the same shape for raw timestamps, used only to
//! answer "how many samples since a cutoff" queries. Entries older than the
//! query horizon are filtered at read time, not evicted eagerly.

use std::collections::VecDeque;
use std::time::Instant;

use crate::{Result, TrimrankError};

/// Fixed-capacity window of numeric samples with oldest-first eviction.
#[derive(Debug, Clone)]
pub struct BoundedWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl BoundedWindow {
    /// Create a window holding at most `capacity` samples.
    ///
    /// Fails fast on a zero capacity — a zero-sized window can never hold a
    /// sample and indicates a misconfiguration, not a runtime condition.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TrimrankError::Configuration(
                "window capacity must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        })
    }

    /// Append a sample, evicting the oldest if the window is full.
    pub fn push(&mut self, sample: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Arithmetic mean of the held samples, or 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Ascending sorted copy of the held samples.
    ///
    /// Taken at read time for percentile computation; the window itself is
    /// never reordered.
    pub fn sorted(&self) -> Vec<f64> {
        let mut v: Vec<f64> = self.samples.iter().copied().collect();
        v.sort_by(f64::total_cmp);
        v
    }
}

/// Bounded log of raw timestamps for rate queries.
#[derive(Debug, Clone)]
pub struct TimestampLog {
    stamps: VecDeque<Instant>,
    capacity: usize,
}

impl TimestampLog {
    /// Create a log holding at most `capacity` timestamps.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TrimrankError::Configuration(
                "timestamp log capacity must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            stamps: VecDeque::new(),
            capacity,
        })
    }

    /// Append a timestamp, evicting the oldest if the log is full.
    pub fn push(&mut self, at: Instant) {
        if self.stamps.len() == self.capacity {
            self.stamps.pop_front();
        }
        self.stamps.push_back(at);
    }

    /// Count timestamps no older than `horizon`.
    pub fn count_within(&self, horizon: std::time::Duration) -> usize {
        self.stamps
            .iter()
            .filter(|ts| ts.elapsed() <= horizon)
            .count()
    }
}
