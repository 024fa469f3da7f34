//! Caller Identity for Nova Microservices
//!
//! This library carries a verified caller's identity across process and
//! transport boundaries: HTTP headers, gRPC metadata and in-process request
//! values all hold the same fixed key set.
//!
//! ## Core Components
//!
//! - **Identity**: Immutable snapshot of who is calling, with authorization helpers
//! - **MetadataCarrier**: Case-insensitive key/value view over gRPC metadata,
//!   HTTP headers or a plain dictionary
//! - **RuleOutcome / DenialReason**: Result of a permission, scope or user-type check
//!
//! ## Usage Example
//!
//! ```rust
//! use request_context::{keys, Identity, RuleOutcome};
//! use tonic::metadata::MetadataMap;
//!
//! let mut metadata = MetadataMap::new();
//! metadata.insert(keys::USER_ID, "u-1".parse().unwrap());
//! metadata.insert(keys::PERMISSIONS, "orders:read;orders:write".parse().unwrap());
//!
//! let identity = Identity::from_metadata(&metadata);
//! assert_eq!(identity.user_id(), "u-1");
//! assert_eq!(identity.has_permission(["orders:write"]).unwrap(), RuleOutcome::Granted);
//!
//! // Forward to a downstream service, asserting this service's own secret
//! let outgoing = identity.propagate(Some("service-secret"));
//! assert_eq!(
//!     outgoing.get(keys::INTERNAL_CALL_PASSWORD).unwrap().to_str().unwrap(),
//!     "service-secret"
//! );
//! ```

mod carrier;
mod identity;
mod rules;

pub use carrier::MetadataCarrier;
pub use identity::{Identity, IdentityBuilder};
pub use rules::{DenialReason, RuleOutcome};

/// Wire metadata keys, lowercase as sent on HTTP/2
pub mod keys {
    pub const USER_ID: &str = "userid";
    pub const USER_NAME: &str = "username";
    pub const USER_EMAIL: &str = "useremail";
    pub const USER_TYPE: &str = "usertype";
    pub const COMPANY_ID: &str = "companyid";
    pub const COMPANY_NAME: &str = "companyname";
    pub const PERMISSIONS: &str = "permissions";
    pub const SCOPES: &str = "scopes";
    pub const CLIENT_ID: &str = "clientid";
    pub const CLIENT_NAME: &str = "clientname";
    pub const INTERNAL_CALL_PASSWORD: &str = "internalcallpassword";
    pub const AUTHORIZATION: &str = "authorization";
    pub const REQUEST_ID: &str = "requestid";
    pub const ACCEPT_LANGUAGE: &str = "accept-language";
    pub const FORWARDED_FOR: &str = "x-forwarded-for";
    pub const USER_AGENT: &str = "user-agent";

    /// Every key an [`crate::Identity`] reads and writes
    pub const ALL: [&str; 16] = [
        USER_ID,
        USER_NAME,
        USER_EMAIL,
        USER_TYPE,
        COMPANY_ID,
        COMPANY_NAME,
        PERMISSIONS,
        SCOPES,
        CLIENT_ID,
        CLIENT_NAME,
        INTERNAL_CALL_PASSWORD,
        AUTHORIZATION,
        REQUEST_ID,
        ACCEPT_LANGUAGE,
        FORWARDED_FOR,
        USER_AGENT,
    ];
}

/// Separator between permissions in the `permissions` value
pub const PERMISSION_SEPARATOR: char = ';';

/// Separator between scopes in the `scopes` value
pub const SCOPE_SEPARATOR: char = ' ';
