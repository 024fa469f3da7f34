//! # Actix Middleware Library
//!
//! Identity authentication for Nova Actix services
//!
//! ## Modules
//! - `identity_auth`: Route authorization middleware and `Caller` extractor
//! - `error`: JSON rendering of `ServiceError`

pub mod error;
pub mod identity_auth;

pub use error::error_response;
pub use identity_auth::{endpoint_key, Caller, HttpAuthConfig, IdentityAuthMiddleware};
