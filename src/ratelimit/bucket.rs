//! Bucket state and the leak/fill transforms.

use std::fmt;

/// Amount one admitted request adds to a bucket.
const UNIT_COST: f64 = 1.0;

/// Snapshot of a single identity's accumulator.
///
/// Buckets are plain values: every transform returns a new bucket and
/// leaves the receiver untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketState {
    /// Current fill level, never negative
    level: f64,
    /// Timestamp of the last leak/fill computation
    last_update: f64,
}

impl BucketState {
    /// Create a bucket. Negative levels are clamped to zero.
    pub fn new(level: f64, last_update: f64) -> Self {
        Self {
            level: level.max(0.0),
            last_update,
        }
    }

    /// An empty bucket first observed at `at`.
    pub fn empty(at: f64) -> Self {
        Self::new(0.0, at)
    }

    /// Get the current fill level.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Get the timestamp of the last observation.
    pub fn last_update(&self) -> f64 {
        self.last_update
    }

    /// Drain the bucket up to `at` at `leak_rate` units per unit time.
    ///
    /// A timestamp earlier than `last_update` moves the clock back without
    /// draining anything. Arbitrarily long gaps drain to exactly zero.
    pub fn leak(&self, at: f64, leak_rate: f64) -> Self {
        if at < self.last_update {
            return Self::new(self.level, at);
        }

        let elapsed = at - self.last_update;
        let drained = elapsed * leak_rate;
        Self::new((self.level - drained).max(0.0), at)
    }

    /// Try to add one unit without exceeding `capacity`.
    ///
    /// Returns `None` on overflow. The timestamp is carried over unchanged.
    pub fn try_fill(&self, capacity: f64) -> Option<Self> {
        let level = self.level + UNIT_COST;
        if level > capacity {
            return None;
        }
        Some(Self::new(level, self.last_update))
    }

    /// The same level observed at `at`.
    pub(crate) fn touched(&self, at: f64) -> Self {
        Self::new(self.level, at)
    }
}

impl fmt::Display for BucketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BucketState{{level={:.2}, last_update={:.2}}}",
            self.level, self.last_update
        )
    }
}
