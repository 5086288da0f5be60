//! Admission backend trait the gRPC service is generic over.

use async_trait::async_trait;

use super::bucket::BucketState;
use super::state::LimiterState;
use crate::error::Result;

/// Trait for admission backends.
///
/// Every method validates its inputs and fails with
/// [`DripError::InvalidArgument`](crate::error::DripError::InvalidArgument)
/// when the identity or the limiter itself is unset.
#[async_trait]
pub trait AdmissionBackend: Send + Sync {
    /// Replace the current limiter with an empty one.
    async fn configure(&self, capacity: f64, leak_rate: f64) -> Result<LimiterState>;

    /// Evaluate a request and return the decision with the stored bucket.
    async fn admit(&self, identity: Option<&str>, at: f64) -> Result<(bool, BucketState)>;

    /// Get the stored bucket for an identity, if it was ever observed.
    async fn bucket(&self, identity: Option<&str>) -> Result<Option<BucketState>>;

    /// Get the bucket for an identity as it would be at `at`.
    async fn bucket_at(&self, identity: Option<&str>, at: f64) -> Result<BucketState>;

    /// Drop buckets last updated before `before`; returns (evicted, remaining).
    async fn evict_idle(&self, before: f64) -> Result<(usize, usize)>;
}
