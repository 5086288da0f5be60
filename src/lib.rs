//! Drip - Per-identity Leaky Bucket Admission Control
//!
//! Each identity owns a bucket that fills by one unit per admitted request
//! and drains continuously at a fixed leak rate. The core in [`ratelimit`]
//! is a set of pure transforms over immutable snapshots; [`grpc`] wraps it
//! in a small service that keeps the current snapshot behind a lock.

pub mod config;
pub mod error;
pub mod grpc;
pub mod ratelimit;
