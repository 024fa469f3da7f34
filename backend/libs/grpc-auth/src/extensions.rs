//! Request Extension Trait for Identity Access
//!
//! Provides helpers for reading the verified caller in gRPC handlers.

use error_types::ServiceError;
use request_context::Identity;
use tonic::{Request, Status};

/// Error name when no identity was stored on the request
pub const IDENTITY_NOT_FOUND: &str = "IDENTITY_NOT_FOUND";

/// Extension trait for accessing the caller's [`Identity`] from gRPC requests
///
/// The identity is stored by [`crate::AuthLayer`]. A missing identity means
/// the layer was not installed, so it is reported as an internal error
/// rather than an authentication failure.
///
/// ## Usage
///
/// ```rust,ignore
/// use grpc_auth::IdentityExt;
///
/// async fn cancel_order(&self, request: Request<CancelOrder>) -> Result<Response<()>, Status> {
///     // Handler-level check on top of the route policy
///     let identity = request.require_permission(["orders:cancel"])?;
///     tracing::info!(user_id = identity.user_id(), "Cancelling order");
///     Ok(Response::new(()))
/// }
/// ```
pub trait IdentityExt {
    /// Identity stored by the auth layer
    fn identity(&self) -> Result<&Identity, Status>;

    /// Require one of `required` permissions
    ///
    /// An empty requirement passes.
    fn require_permission<I, S>(&self, required: I) -> Result<&Identity, Status>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>;

    /// Require one of `required` scopes
    ///
    /// An empty requirement passes.
    fn require_scope<I, S>(&self, required: I) -> Result<&Identity, Status>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>;
}

impl<T> IdentityExt for Request<T> {
    fn identity(&self) -> Result<&Identity, Status> {
        self.extensions().get::<Identity>().ok_or_else(|| {
            ServiceError::internal("identity not found on request")
                .with_name(IDENTITY_NOT_FOUND)
                .into()
        })
    }

    fn require_permission<I, S>(&self, required: I) -> Result<&Identity, Status>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identity = self.identity()?;
        identity.has_permission(required)?;
        Ok(identity)
    }

    fn require_scope<I, S>(&self, required: I) -> Result<&Identity, Status>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let identity = self.identity()?;
        identity.has_scope(required)?;
        Ok(identity)
    }
}
