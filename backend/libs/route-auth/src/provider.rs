//! Collaborators supplied by the hosting service
//!
//! Neither trait is implemented here: token introspection and route policy
//! storage live in other services. Errors they return are passed through to
//! the caller unchanged.

use crate::RouteRequirement;
use async_trait::async_trait;
use error_types::ServiceError;
use request_context::Identity;

/// Result of introspecting a bearer token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenInfoResponse {
    /// Present for user tokens
    pub token_info: Option<TokenInfo>,
    /// Present when the token was issued to a client application
    pub client_info: Option<ClientInfo>,
    /// Space-joined granted scopes
    pub scope: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenInfo {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_type: String,
    pub company_id: String,
    pub company_name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_name: String,
}

/// Resolves a bearer token into its owner
#[async_trait]
pub trait TokenIntrospector: Send + Sync {
    /// `bearer` is the token without the `Bearer ` prefix
    async fn token_info(&self, bearer: &str) -> Result<TokenInfoResponse, ServiceError>;
}

/// Dynamic per-route policy
#[async_trait]
pub trait RouteConfigProvider: Send + Sync {
    /// Extra requirements for `endpoint`, unioned with the static ones
    async fn route_config(&self, endpoint: &str) -> Result<Option<RouteRequirement>, ServiceError>;

    /// Veto hook run before any requirement check; an error denies verbatim
    async fn check_route_permission(
        &self,
        endpoint: &str,
        identity: &Identity,
    ) -> Result<(), ServiceError>;
}
