//! Client-side identity propagation
//!
//! Writes the caller's identity into outgoing gRPC metadata so the next
//! service sees the same user, permissions and request id.

use crate::IdentityExt;
use request_context::Identity;
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Client-side interceptor that forwards an [`Identity`]
///
/// Every outgoing request gets the full identity key set; other metadata
/// set by the caller is left alone.
///
/// ## Usage
///
/// ```rust,ignore
/// use grpc_auth::PropagationInterceptor;
///
/// let interceptor = PropagationInterceptor::new(identity.clone())
///     .with_internal_call_secret("billing-secret");
/// let mut client = BillingClient::with_interceptor(channel, interceptor);
/// ```
#[derive(Clone, Debug)]
pub struct PropagationInterceptor {
    identity: Identity,
    override_secret: Option<String>,
}

impl PropagationInterceptor {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            override_secret: None,
        }
    }

    /// Forward the identity attached to an inbound request
    pub fn from_request<T>(request: &Request<T>) -> Result<Self, Status> {
        Ok(Self::new(request.identity()?.clone()))
    }

    /// Assert this service's own internal-call secret downstream
    ///
    /// Takes precedence over the secret carried by the identity.
    pub fn with_internal_call_secret(mut self, secret: impl Into<String>) -> Self {
        self.override_secret = Some(secret.into());
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl Interceptor for PropagationInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        self.identity
            .propagate_into(request.metadata_mut(), self.override_secret.as_deref());
        Ok(request)
    }
}
