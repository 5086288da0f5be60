//! Protobuf messages for the `drip.v1` package.
//!
//! Messages are declared with `prost` derives directly; the service stubs in
//! `leaky_bucket_server` and `leaky_bucket_client` are generated by the build
//! script.

use crate::ratelimit::{BucketState, LimiterState};

/// A bucket snapshot on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Bucket {
    #[prost(double, tag = "1")]
    pub level: f64,
    #[prost(double, tag = "2")]
    pub last_update: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigureRequest {
    #[prost(double, tag = "1")]
    pub capacity: f64,
    #[prost(double, tag = "2")]
    pub leak_rate: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConfigureResponse {
    #[prost(double, tag = "1")]
    pub capacity: f64,
    #[prost(double, tag = "2")]
    pub leak_rate: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdmitRequest {
    #[prost(string, optional, tag = "1")]
    pub identity: ::core::option::Option<::prost::alloc::string::String>,
    /// Seconds; the server clock is used when unset
    #[prost(double, optional, tag = "2")]
    pub timestamp: ::core::option::Option<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AdmitResponse {
    #[prost(bool, tag = "1")]
    pub admitted: bool,
    #[prost(message, optional, tag = "2")]
    pub bucket: ::core::option::Option<Bucket>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBucketRequest {
    #[prost(string, optional, tag = "1")]
    pub identity: ::core::option::Option<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetBucketResponse {
    #[prost(bool, tag = "1")]
    pub found: bool,
    #[prost(message, optional, tag = "2")]
    pub bucket: ::core::option::Option<Bucket>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProjectBucketRequest {
    #[prost(string, optional, tag = "1")]
    pub identity: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(double, optional, tag = "2")]
    pub timestamp: ::core::option::Option<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProjectBucketResponse {
    #[prost(message, optional, tag = "1")]
    pub bucket: ::core::option::Option<Bucket>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EvictIdleRequest {
    /// Buckets last updated strictly before this timestamp are dropped
    #[prost(double, tag = "1")]
    pub before: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EvictIdleResponse {
    #[prost(uint64, tag = "1")]
    pub evicted: u64,
    #[prost(uint64, tag = "2")]
    pub remaining: u64,
}

impl From<BucketState> for Bucket {
    fn from(bucket: BucketState) -> Self {
        Self {
            level: bucket.level(),
            last_update: bucket.last_update(),
        }
    }
}

impl From<&LimiterState> for ConfigureResponse {
    fn from(state: &LimiterState) -> Self {
        Self {
            capacity: state.capacity(),
            leak_rate: state.leak_rate(),
        }
    }
}

include!(concat!(env!("OUT_DIR"), "/drip.v1.LeakyBucket.rs"));
