//! Server-side authentication layer
//!
//! Runs [`RequestAuthenticator`] before the wrapped tonic service. The
//! endpoint key is the request path, `/package.Service/Method`.

use error_types::ServiceError;
use http::header::{HeaderValue, CONTENT_TYPE};
use request_context::Identity;
use route_auth::RequestAuthenticator;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tonic::body::{empty_body, BoxBody};
use tonic::Status;
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Tower layer installing [`AuthMiddleware`]
///
/// ## Usage
///
/// ```rust,ignore
/// Server::builder()
///     .layer(AuthLayer::new(authenticator))
///     .add_service(svc)
/// ```
#[derive(Clone, Debug)]
pub struct AuthLayer {
    authenticator: RequestAuthenticator,
}

impl AuthLayer {
    pub fn new(authenticator: RequestAuthenticator) -> Self {
        Self { authenticator }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, service: S) -> Self::Service {
        AuthMiddleware {
            inner: service,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Authenticating wrapper around a gRPC service
///
/// On success the verified identity replaces the identity keys in the
/// request headers and is inserted into request extensions. On failure the
/// caller gets a trailers-only response carrying the error status.
#[derive(Clone, Debug)]
pub struct AuthMiddleware<S> {
    inner: S,
    authenticator: RequestAuthenticator,
}

impl<S, ReqBody> Service<http::Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<BoxBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        // Keep the instance poll_ready was called on
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            let endpoint = req.uri().path().to_string();
            let inbound = Identity::from_metadata(req.headers());

            match authenticator.authenticate(inbound, &endpoint).await {
                Ok(identity) => {
                    debug!(endpoint = %endpoint, user_id = identity.user_id(), "Request authenticated");
                    identity.write_metadata(req.headers_mut());
                    req.extensions_mut().insert(identity);
                    inner.call(req).await
                }
                Err(error) => {
                    error.log();
                    Ok(status_response(&error))
                }
            }
        })
    }
}

/// Trailers-only gRPC response for `error`
fn status_response(error: &ServiceError) -> http::Response<BoxBody> {
    let status = Status::from(error);
    let mut response = http::Response::new(empty_body());
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));

    if let Err(e) = status.add_header(headers) {
        warn!(error = %e, "Failed to encode gRPC status headers");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_carries_grpc_status() {
        let error = ServiceError::unauthorized("unauthorized: scope").with_name("UNAUTHORIZED_SCOPE");
        let response = status_response(&error);

        assert_eq!(response.status(), http::StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "application/grpc");
        // PermissionDenied
        assert_eq!(response.headers()["grpc-status"], "7");
        assert!(response.headers().contains_key("grpc-status-details-bin"));
    }
}
