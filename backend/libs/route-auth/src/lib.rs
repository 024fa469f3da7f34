//! Route Authorization for Nova Microservices
//!
//! Decides, per endpoint, whether a caller may proceed. Both transport
//! adapters (`grpc-auth` and `actix-middleware`) share this crate so HTTP
//! and gRPC callers get identical decisions.
//!
//! ## Decision Flow
//!
//! ```text
//! public route? ──yes──> allow
//!      │
//! internal call? ──yes──> allow
//!      │
//! Bearer token ──> TokenIntrospector ──> merged Identity
//!      │
//! static + dynamic RouteRequirement ──> policy veto
//!      │
//! trusted user type? ──yes──> allow
//!      │
//! user type ──> permission ──> scope ──> allow | deny
//! ```
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use route_auth::{AuthConfig, AuthService, RequestAuthenticator};
//! use std::sync::Arc;
//!
//! let config = AuthConfig::load("config/auth.toml")?;
//! let service = Arc::new(AuthService::new(config, None)?);
//! let authenticator = RequestAuthenticator::new(service, Arc::new(my_introspector));
//!
//! let identity = authenticator.authenticate(inbound, "/orders.v1.Orders/Create").await?;
//! ```

pub mod authenticator;
pub mod config;
pub mod provider;
pub mod requirement;
pub mod service;

pub use authenticator::{unauthenticated_error, AnonymousAccess, RequestAuthenticator, UNAUTHENTICATED};
pub use config::{AuthConfig, ConfigError};
pub use provider::{ClientInfo, RouteConfigProvider, TokenInfo, TokenInfoResponse, TokenIntrospector};
pub use requirement::RouteRequirement;
pub use service::{AuthService, HEALTH_CHECK_ROUTES};
