//! Limiter state and the admission operation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

use super::bucket::BucketState;
use crate::error::{DripError, Result};

/// Immutable snapshot of a limiter: its configuration plus one bucket per
/// identity seen so far.
///
/// Every update returns a new snapshot. The identity map is shared
/// copy-on-write, so cloning a snapshot is cheap and snapshots can be read
/// from any number of threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct LimiterState {
    /// Maximum fill level of any bucket
    capacity: f64,
    /// Units drained per unit time
    leak_rate: f64,
    /// Buckets indexed by identity
    buckets: Arc<HashMap<String, BucketState>>,
}

/// Outcome of a single admission call.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct AdmissionResult {
    /// Whether the request was admitted
    pub admitted: bool,
    /// The state to use for the next call, regardless of the decision
    pub state: LimiterState,
}

fn validate_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(DripError::invalid_argument(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

impl LimiterState {
    /// Create an empty limiter.
    ///
    /// Fails with [`DripError::InvalidArgument`] unless both `capacity` and
    /// `leak_rate` are positive and finite.
    pub fn new(capacity: f64, leak_rate: f64) -> Result<Self> {
        validate_positive("capacity", capacity)?;
        validate_positive("leak rate", leak_rate)?;

        Ok(Self {
            capacity,
            leak_rate,
            buckets: Arc::new(HashMap::new()),
        })
    }

    /// Get the capacity of every bucket.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Get the leak rate in units per unit time.
    pub fn leak_rate(&self) -> f64 {
        self.leak_rate
    }

    /// Number of tracked identities.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no identity has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Iterate over the tracked identities in no particular order.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    /// Evaluate one request from `identity` at time `at`.
    ///
    /// The identity's bucket (a fresh, empty one observed at `at` if it was
    /// never seen) is leaked up to `at` and then filled by one unit. On
    /// overflow the request is rejected and the bucket keeps its leaked level,
    /// but its timestamp still advances to `at`.
    pub fn admit(&self, identity: &str, at: f64) -> AdmissionResult {
        let leaked = self.bucket_at(identity, at);

        let (admitted, bucket) = match leaked.try_fill(self.capacity) {
            Some(filled) => (true, filled),
            None => {
                debug!(
                    identity = %identity,
                    level = leaked.level(),
                    capacity = self.capacity,
                    "Bucket overflow, rejecting request"
                );
                (false, leaked.touched(at))
            }
        };

        trace!(
            identity = %identity,
            at = at,
            level = bucket.level(),
            admitted = admitted,
            "Evaluated admission"
        );

        AdmissionResult {
            admitted,
            state: self.with_bucket(identity, bucket),
        }
    }

    /// The stored bucket for `identity`, without applying any leak.
    ///
    /// Returns `None` if the identity has never been observed.
    pub fn bucket(&self, identity: &str) -> Option<BucketState> {
        self.buckets.get(identity).copied()
    }

    /// What the bucket for `identity` would look like at `at`.
    ///
    /// Unknown identities yield an empty bucket observed at `at`. Nothing is
    /// stored.
    pub fn bucket_at(&self, identity: &str, at: f64) -> BucketState {
        match self.buckets.get(identity) {
            Some(bucket) => bucket.leak(at, self.leak_rate),
            None => BucketState::empty(at),
        }
    }

    /// A new snapshot with the bucket for `identity` replaced.
    pub fn with_bucket(&self, identity: impl Into<String>, bucket: BucketState) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.buckets).insert(identity.into(), bucket);
        next
    }

    /// A new snapshot without the bucket for `identity`.
    pub fn without_bucket(&self, identity: &str) -> Self {
        if !self.buckets.contains_key(identity) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.buckets).remove(identity);
        next
    }

    /// A new snapshot without every bucket last updated before `before`,
    /// together with the number of buckets dropped.
    pub fn evict_idle(&self, before: f64) -> (Self, usize) {
        let idle = self
            .buckets
            .values()
            .filter(|b| b.last_update() < before)
            .count();
        if idle == 0 {
            return (self.clone(), 0);
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.buckets).retain(|_, b| b.last_update() >= before);
        debug!(evicted = idle, remaining = next.len(), "Evicted idle buckets");
        (next, idle)
    }
}

impl fmt::Display for LimiterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LimiterState{{capacity={:.1}, leak_rate={:.1}, identities={}}}",
            self.capacity,
            self.leak_rate,
            self.buckets.len()
        )
    }
}
