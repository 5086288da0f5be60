//! Guarded slot holding the current limiter snapshot.

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, info, trace};

use super::backend::AdmissionBackend;
use super::bucket::BucketState;
use super::identity::{require_identity, require_timestamp};
use super::state::LimiterState;
use crate::error::{DripError, Result};

/// The mutable "current limiter" a hosting service evaluates against.
///
/// Snapshots themselves are immutable; this type serializes the
/// read-evaluate-store sequence so that concurrent admissions never
/// overwrite each other's updates.
pub struct SharedLimiter {
    /// Latest snapshot, `None` until a limiter is configured
    current: RwLock<Option<LimiterState>>,
}

impl SharedLimiter {
    /// Create a slot with no limiter configured.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
        }
    }

    /// Create a slot holding `state`.
    pub fn with_state(state: LimiterState) -> Self {
        Self {
            current: RwLock::new(Some(state)),
        }
    }

    /// Install a fresh limiter, discarding every tracked bucket.
    pub fn configure(&self, capacity: f64, leak_rate: f64) -> Result<LimiterState> {
        let state = LimiterState::new(capacity, leak_rate)?;
        let previous = self.current.write().replace(state.clone());

        info!(
            capacity = capacity,
            leak_rate = leak_rate,
            dropped_identities = previous.map(|s| s.len()).unwrap_or(0),
            "Limiter configured"
        );
        Ok(state)
    }

    /// Get the current snapshot.
    pub fn snapshot(&self) -> Result<LimiterState> {
        self.current.read().clone().ok_or_else(not_configured)
    }

    /// Admit or reject one request, storing the resulting snapshot.
    pub fn admit(&self, identity: Option<&str>, at: f64) -> Result<(bool, BucketState)> {
        let identity = require_identity(identity)?;
        let at = require_timestamp(at)?;

        let mut current = self.current.write();
        let state = current.as_ref().ok_or_else(not_configured)?;

        if state.bucket(identity).is_none() {
            debug!(identity = %identity, "Tracking new identity");
        }

        let result = state.admit(identity, at);
        let bucket = result.state.bucket(identity).unwrap_or_else(|| BucketState::empty(at));
        *current = Some(result.state);

        trace!(identity = %identity, admitted = result.admitted, "Stored admission result");
        Ok((result.admitted, bucket))
    }

    /// Get the stored bucket for `identity` without leaking it.
    pub fn bucket(&self, identity: Option<&str>) -> Result<Option<BucketState>> {
        let identity = require_identity(identity)?;
        let current = self.current.read();
        let state = current.as_ref().ok_or_else(not_configured)?;
        Ok(state.bucket(identity))
    }

    /// Project the bucket for `identity` to `at` without storing it.
    pub fn bucket_at(&self, identity: Option<&str>, at: f64) -> Result<BucketState> {
        let identity = require_identity(identity)?;
        let at = require_timestamp(at)?;
        let current = self.current.read();
        let state = current.as_ref().ok_or_else(not_configured)?;
        Ok(state.bucket_at(identity, at))
    }

    /// Drop every bucket last updated before `before`.
    ///
    /// Returns the number of buckets evicted and the number remaining.
    pub fn evict_idle(&self, before: f64) -> Result<(usize, usize)> {
        let before = require_timestamp(before)?;
        let mut current = self.current.write();
        let state = current.as_ref().ok_or_else(not_configured)?;

        let (next, evicted) = state.evict_idle(before);
        let remaining = next.len();
        *current = Some(next);
        Ok((evicted, remaining))
    }
}

impl Default for SharedLimiter {
    fn default() -> Self {
        Self::new()
    }
}

fn not_configured() -> DripError {
    DripError::invalid_argument("rate limiter is not configured")
}

#[async_trait]
impl AdmissionBackend for SharedLimiter {
    async fn configure(&self, capacity: f64, leak_rate: f64) -> Result<LimiterState> {
        SharedLimiter::configure(self, capacity, leak_rate)
    }

    async fn admit(&self, identity: Option<&str>, at: f64) -> Result<(bool, BucketState)> {
        SharedLimiter::admit(self, identity, at)
    }

    async fn bucket(&self, identity: Option<&str>) -> Result<Option<BucketState>> {
        SharedLimiter::bucket(self, identity)
    }

    async fn bucket_at(&self, identity: Option<&str>, at: f64) -> Result<BucketState> {
        SharedLimiter::bucket_at(self, identity, at)
    }

    async fn evict_idle(&self, before: f64) -> Result<(usize, usize)> {
        SharedLimiter::evict_idle(self, before)
    }
}
