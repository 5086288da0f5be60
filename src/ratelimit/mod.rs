//! Leaky bucket admission logic and state management.

mod backend;
mod bucket;
mod identity;
mod shared;
mod state;

pub use backend::AdmissionBackend;
pub use bucket::BucketState;
pub use identity::{require_identity, require_timestamp};
pub use shared::SharedLimiter;
pub use state::{AdmissionResult, LimiterState};
