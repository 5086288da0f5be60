//! Leaky bucket service implementation.

use chrono::Utc;
use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, info, instrument, warn};

use super::proto::leaky_bucket_server::LeakyBucket;
use super::proto::{
    AdmitRequest, AdmitResponse, ConfigureRequest, ConfigureResponse, EvictIdleRequest,
    EvictIdleResponse, GetBucketRequest, GetBucketResponse, ProjectBucketRequest,
    ProjectBucketResponse,
};
use crate::error::DripError;
use crate::ratelimit::AdmissionBackend;

/// Implementation of the `drip.v1.LeakyBucket` gRPC interface.
pub struct LeakyBucketServiceImpl<R: AdmissionBackend> {
    /// The admission backend
    backend: Arc<R>,
}

impl<R: AdmissionBackend> LeakyBucketServiceImpl<R> {
    /// Create a new LeakyBucketServiceImpl with the given backend.
    pub fn new(backend: Arc<R>) -> Self {
        Self { backend }
    }
}

impl From<DripError> for Status {
    fn from(err: DripError) -> Self {
        match err {
            DripError::InvalidArgument(msg) => Status::invalid_argument(msg),
            other => Status::internal(other.to_string()),
        }
    }
}

/// Current wall clock time in fractional seconds since the Unix epoch.
fn wall_clock_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

fn reject(err: DripError) -> Status {
    warn!(error = %err, "Rejected invalid request");
    err.into()
}

#[tonic::async_trait]
impl<R: AdmissionBackend + 'static> LeakyBucket for LeakyBucketServiceImpl<R> {
    /// Replace the served limiter with a fresh one.
    #[instrument(skip(self, request))]
    async fn configure(
        &self,
        request: Request<ConfigureRequest>,
    ) -> Result<Response<ConfigureResponse>, Status> {
        let req = request.into_inner();

        let state = self
            .backend
            .configure(req.capacity, req.leak_rate)
            .await
            .map_err(reject)?;

        Ok(Response::new(ConfigureResponse::from(&state)))
    }

    /// Decide whether a request from an identity is admitted.
    #[instrument(
        skip(self, request),
        fields(
            identity = ?request.get_ref().identity,
            timestamp = ?request.get_ref().timestamp
        )
    )]
    async fn admit(
        &self,
        request: Request<AdmitRequest>,
    ) -> Result<Response<AdmitResponse>, Status> {
        let req = request.into_inner();
        let at = req.timestamp.unwrap_or_else(wall_clock_secs);

        let (admitted, bucket) = self
            .backend
            .admit(req.identity.as_deref(), at)
            .await
            .map_err(reject)?;

        if admitted {
            debug!(level = bucket.level(), "Request admitted");
        } else {
            info!(level = bucket.level(), "Request rejected, bucket full");
        }

        Ok(Response::new(AdmitResponse {
            admitted,
            bucket: Some(bucket.into()),
        }))
    }

    /// Return the stored bucket for an identity without leaking it.
    #[instrument(skip(self, request), fields(identity = ?request.get_ref().identity))]
    async fn get_bucket(
        &self,
        request: Request<GetBucketRequest>,
    ) -> Result<Response<GetBucketResponse>, Status> {
        let req = request.into_inner();

        let bucket = self
            .backend
            .bucket(req.identity.as_deref())
            .await
            .map_err(reject)?;

        Ok(Response::new(GetBucketResponse {
            found: bucket.is_some(),
            bucket: bucket.map(Into::into),
        }))
    }

    /// Return what an identity's bucket would look like at a timestamp.
    #[instrument(skip(self, request), fields(identity = ?request.get_ref().identity))]
    async fn project_bucket(
        &self,
        request: Request<ProjectBucketRequest>,
    ) -> Result<Response<ProjectBucketResponse>, Status> {
        let req = request.into_inner();
        let at = req.timestamp.unwrap_or_else(wall_clock_secs);

        let bucket = self
            .backend
            .bucket_at(req.identity.as_deref(), at)
            .await
            .map_err(reject)?;

        Ok(Response::new(ProjectBucketResponse {
            bucket: Some(bucket.into()),
        }))
    }

    /// Drop buckets that have been idle since before a timestamp.
    #[instrument(skip(self, request), fields(before = request.get_ref().before))]
    async fn evict_idle(
        &self,
        request: Request<EvictIdleRequest>,
    ) -> Result<Response<EvictIdleResponse>, Status> {
        let req = request.into_inner();

        let (evicted, remaining) = self
            .backend
            .evict_idle(req.before)
            .await
            .map_err(reject)?;

        info!(evicted = evicted, remaining = remaining, "Idle buckets evicted");

        Ok(Response::new(EvictIdleResponse {
            evicted: evicted as u64,
            remaining: remaining as u64,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::SharedLimiter;

    fn service() -> LeakyBucketServiceImpl<SharedLimiter> {
        let limiter = SharedLimiter::new();
        limiter.configure(5.0, 1.0).unwrap();
        LeakyBucketServiceImpl::new(Arc::new(limiter))
    }

    fn admit_request(identity: Option<&str>, timestamp: f64) -> Request<AdmitRequest> {
        Request::new(AdmitRequest {
            identity: identity.map(str::to_string),
            timestamp: Some(timestamp),
        })
    }

    #[tokio::test]
    async fn test_missing_identity_rejected() {
        let result = service().admit(admit_request(None, 0.0)).await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_unconfigured_limiter_rejected() {
        let service = LeakyBucketServiceImpl::new(Arc::new(SharedLimiter::new()));

        let result = service.admit(admit_request(Some("user1"), 0.0)).await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_invalid_configuration_rejected() {
        let result = service()
            .configure(Request::new(ConfigureRequest {
                capacity: -1.0,
                leak_rate: 1.0,
            }))
            .await;
        assert_eq!(result.unwrap_err().code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_admit_until_full() {
        let service = service();

        for _ in 0..5 {
            let response = service
                .admit(admit_request(Some("user1"), 0.0))
                .await
                .unwrap()
                .into_inner();
            assert!(response.admitted);
        }

        let response = service
            .admit(admit_request(Some("user1"), 0.0))
            .await
            .unwrap()
            .into_inner();
        assert!(!response.admitted);
        assert_eq!(response.bucket.unwrap().level, 5.0);
    }

    #[tokio::test]
    async fn test_get_bucket_not_found() {
        let response = service()
            .get_bucket(Request::new(GetBucketRequest {
                identity: Some("nobody".to_string()),
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(!response.found);
        assert!(response.bucket.is_none());
    }

    #[tokio::test]
    async fn test_project_bucket_does_not_store() {
        let service = service();
        service.admit(admit_request(Some("user1"), 0.0)).await.unwrap();

        let projected = service
            .project_bucket(Request::new(ProjectBucketRequest {
                identity: Some("user1".to_string()),
                timestamp: Some(10.0),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(projected.bucket.unwrap().level, 0.0);

        let stored = service
            .get_bucket(Request::new(GetBucketRequest {
                identity: Some("user1".to_string()),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(stored.bucket.unwrap().level, 1.0);
    }

    #[tokio::test]
    async fn test_admit_defaults_to_wall_clock() {
        let service = service();
        let before = wall_clock_secs();

        let response = service
            .admit(Request::new(AdmitRequest {
                identity: Some("user1".to_string()),
                timestamp: None,
            }))
            .await
            .unwrap()
            .into_inner();

        assert!(response.admitted);
        assert!(response.bucket.unwrap().last_update >= before);
    }
}
