//! gRPC server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{error, info};

use super::proto::leaky_bucket_server::LeakyBucketServer;
use super::service::LeakyBucketServiceImpl;
use crate::error::{DripError, Result};
use crate::ratelimit::AdmissionBackend;

/// gRPC server for the leaky bucket service.
pub struct GrpcServer<R: AdmissionBackend + 'static> {
    /// Address to bind to
    addr: SocketAddr,
    /// The admission backend
    backend: Arc<R>,
}

impl<R: AdmissionBackend + 'static> GrpcServer<R> {
    /// Create a new gRPC server.
    pub fn new(addr: SocketAddr, backend: Arc<R>) -> Self {
        Self { addr, backend }
    }

    /// Get the configured bind address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the gRPC server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let service = LeakyBucketServiceImpl::new(self.backend);

        info!(
            addr = %self.addr,
            "Starting gRPC server for LeakyBucket with graceful shutdown"
        );

        Server::builder()
            .add_service(LeakyBucketServer::new(service))
            .serve_with_shutdown(self.addr, signal)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                DripError::Grpc(e)
            })
    }

    /// Serve on an already bound listener until `signal` resolves.
    ///
    /// The configured address is ignored; binding port 0 and passing the
    /// listener here is how tests get an ephemeral port.
    pub async fn serve_with_listener<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send,
    {
        let service = LeakyBucketServiceImpl::new(self.backend);

        info!(
            addr = ?listener.local_addr().ok(),
            "Starting gRPC server for LeakyBucket on bound listener"
        );

        Server::builder()
            .add_service(LeakyBucketServer::new(service))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), signal)
            .await
            .map_err(|e| {
                error!(error = %e, "gRPC server failed");
                DripError::Grpc(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::SharedLimiter;

    #[test]
    fn test_server_creation() {
        let addr: SocketAddr = "127.0.0.1:8081".parse().unwrap();
        let server = GrpcServer::new(addr, Arc::new(SharedLimiter::new()));
        assert_eq!(server.addr(), addr);
    }
}
