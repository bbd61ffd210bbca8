//! Bounded, time-ordered sample history with range queries and aggregates.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::types::Sample;

/// 24 hours at a 30 second interval
pub const DEFAULT_HISTORY_SIZE: usize = 2880;

/// Bounded, time-ordered sample store. Oldest samples are evicted first.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    capacity: usize,
    samples: VecDeque<Sample>,
}

/// Window selector for aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The most recent `n` samples
    Count(usize),
    /// Samples no older than `now - duration`
    Duration(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub count: usize,
}

impl HistoryRing {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Append a sample, evicting the oldest one at capacity.
    ///
    /// Timestamps never go backwards: a sample older than the newest entry
    /// (wall clock stepped back) is stored with the newest entry's timestamp.
    pub fn append(&mut self, mut sample: Sample) {
        if let Some(last) = self.samples.back() {
            if sample.timestamp < last.timestamp {
                log::warn!(
                    "Clock went backwards ({} < {}), clamping sample timestamp",
                    sample.timestamp,
                    last.timestamp
                );
                sample.timestamp = last.timestamp;
            }
        }

        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Samples with `from <= timestamp <= to`, oldest first.
    ///
    /// The iterator is lazy and `Clone`, so it can be restarted.
    pub fn query(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl Iterator<Item = &Sample> + Clone + '_ {
        let start = self.samples.partition_point(|s| s.timestamp < from);
        self.samples
            .range(start..)
            .take_while(move |s| s.timestamp <= to)
    }

    /// The most recent `n` samples, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Sample> + Clone + '_ {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.range(skip..)
    }

    pub fn since(&self, now: DateTime<Utc>, window: Duration) -> impl Iterator<Item = &Sample> + Clone + '_ {
        self.query(now - window, now)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> + Clone + '_ {
        self.samples.iter()
    }

    /// min/max/mean over valid samples in the window; `None` when there are none.
    pub fn aggregate(&self, window: Window, now: DateTime<Utc>) -> Option<Aggregate> {
        match window {
            Window::Count(n) => aggregate_samples(self.recent(n)),
            Window::Duration(d) => aggregate_samples(self.since(now, d)),
        }
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new()
    }
}

fn aggregate_samples<'a>(samples: impl Iterator<Item = &'a Sample>) -> Option<Aggregate> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for t in samples.filter_map(Sample::valid_temperature) {
        min = min.min(t);
        max = max.max(t);
        sum += t as f64;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    Some(Aggregate {
        min,
        max,
        mean: (sum / count as f64) as f32,
        count,
    })
}

/// History ring shared between the engine (single writer) and readers.
///
/// Locks are held only for the duration of one call; readers get owned copies.
#[derive(Debug, Clone)]
pub struct SharedHistory {
    inner: Arc<RwLock<HistoryRing>>,
}

impl SharedHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HistoryRing::with_capacity(capacity))),
        }
    }

    pub fn append(&self, sample: Sample) -> usize {
        let mut ring = self.inner.write();
        ring.append(sample);
        ring.len()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    pub fn latest(&self) -> Option<Sample> {
        self.inner.read().latest().copied()
    }

    pub fn range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Sample> {
        self.inner.read().query(from, to).copied().collect()
    }

    pub fn recent(&self, n: usize) -> Vec<Sample> {
        self.inner.read().recent(n).copied().collect()
    }

    pub fn since(&self, now: DateTime<Utc>, window: Duration) -> Vec<Sample> {
        self.inner.read().since(now, window).copied().collect()
    }

    pub fn all(&self) -> Vec<Sample> {
        self.inner.read().iter().copied().collect()
    }

    pub fn aggregate(&self, window: Window, now: DateTime<Utc>) -> Option<Aggregate> {
        self.inner.read().aggregate(window, now)
    }
}
