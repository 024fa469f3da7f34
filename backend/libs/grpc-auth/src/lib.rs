//! Identity Authentication for gRPC Microservices
//!
//! This library puts the shared route authorization in front of tonic
//! servers and carries the caller's identity to downstream services.
//!
//! ## Core Components
//!
//! - **AuthLayer**: Tower layer that authenticates every inbound call and
//!   stores the verified [`Identity`] in request extensions
//! - **IdentityExt**: Request extension trait for reading the identity in handlers
//! - **PropagationInterceptor**: Writes an identity into outgoing metadata
//! - **request_id_interceptor / accept_language_interceptor**: Inbound
//!   metadata normalization
//!
//! ## Usage Example
//!
//! ### Server Side
//!
//! ```rust,ignore
//! use grpc_auth::AuthLayer;
//! use route_auth::{AuthConfig, AuthService, RequestAuthenticator};
//! use std::sync::Arc;
//! use tonic::transport::Server;
//!
//! let service = Arc::new(AuthService::new(AuthConfig::load("auth.toml")?, None)?);
//! let authenticator = RequestAuthenticator::new(service, Arc::new(introspection_client));
//!
//! Server::builder()
//!     .layer(AuthLayer::new(authenticator))
//!     .add_service(OrdersServer::new(orders))
//!     .serve(addr)
//!     .await?;
//! ```
//!
//! ### Handler
//!
//! ```rust,ignore
//! use grpc_auth::{IdentityExt, PropagationInterceptor};
//!
//! async fn create_order(&self, request: Request<CreateOrder>) -> Result<Response<Order>, Status> {
//!     let identity = request.identity()?;
//!     let interceptor = PropagationInterceptor::new(identity.clone());
//!     let mut billing = BillingClient::with_interceptor(self.channel.clone(), interceptor);
//!     // ...
//! }
//! ```
//!
//! ## Failure Mapping
//!
//! Denials are answered by the layer itself with a trailers-only response;
//! the wrapped service is never called. Status codes and details follow the
//! shared error taxonomy, so a peer can rebuild the original `ServiceError`.

mod client;
mod extensions;
mod interceptors;
mod server;

pub use client::PropagationInterceptor;
pub use extensions::{IdentityExt, IDENTITY_NOT_FOUND};
pub use interceptors::{
    accept_language_interceptor, request_id_interceptor, GATEWAY_ACCEPT_LANGUAGE,
};
pub use server::{AuthLayer, AuthMiddleware};

pub use request_context::Identity;

// Re-export tonic Status for convenience
pub use tonic::Status;
