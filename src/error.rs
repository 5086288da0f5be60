//! Error types for the Drip service.

use thiserror::Error;

/// Main error type for Drip operations.
///
/// Rejected admissions are not errors; they are reported through
/// [`AdmissionResult::admitted`](crate::ratelimit::AdmissionResult::admitted).
#[derive(Error, Debug)]
pub enum DripError {
    /// A caller broke an input contract (unset identity, unconfigured
    /// limiter, non-positive capacity or leak rate).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// gRPC server errors
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::transport::Error),
}

impl DripError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        DripError::InvalidArgument(msg.into())
    }
}

impl From<config::ConfigError> for DripError {
    fn from(err: config::ConfigError) -> Self {
        DripError::Config(err.to_string())
    }
}

/// Result type alias for Drip operations.
pub type Result<T> = std::result::Result<T, DripError>;
