//! gRPC surface for the leaky bucket limiter.

pub mod proto;
mod server;
mod service;

pub use server::GrpcServer;
pub use service::LeakyBucketServiceImpl;

// Re-export commonly used types
pub use proto::leaky_bucket_client::LeakyBucketClient;
pub use proto::leaky_bucket_server::{LeakyBucket, LeakyBucketServer};
