//! Bearer-token authentication shared by the transport adapters
//!
//! Turns an inbound identity (read from headers or metadata) into a
//! verified one: public routes and internal calls pass through, everything
//! else must carry `Authorization: Bearer <token>`, which is introspected and
//! merged into the identity before [`AuthService::authenticate`] runs.
//!
//! Caller fields (user, company, permissions, client) are only taken from
//! inbound headers on internal calls. Any other request keeps its transport
//! values and gets caller fields from introspection alone.

use crate::{AuthService, TokenInfoResponse, TokenIntrospector};
use error_types::ServiceError;
use request_context::{Identity, IdentityBuilder};
use std::sync::Arc;
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Error name for a missing or malformed bearer token
pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";

/// What to do when the bearer token is missing or malformed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnonymousAccess {
    /// Reject with Unauthenticated
    #[default]
    Deny,
    /// Let the request through unauthenticated; resolvers check later
    Allow,
}

#[derive(Clone)]
pub struct RequestAuthenticator {
    service: Arc<AuthService>,
    introspector: Arc<dyn TokenIntrospector>,
    anonymous: AnonymousAccess,
}

impl RequestAuthenticator {
    pub fn new(service: Arc<AuthService>, introspector: Arc<dyn TokenIntrospector>) -> Self {
        Self {
            service,
            introspector,
            anonymous: AnonymousAccess::Deny,
        }
    }

    pub fn with_anonymous_access(mut self, anonymous: AnonymousAccess) -> Self {
        self.anonymous = anonymous;
        self
    }

    pub fn service(&self) -> &Arc<AuthService> {
        &self.service
    }

    /// Authenticate and authorize one request
    ///
    /// Returns the identity handlers should see: the inbound one for
    /// internal calls, its transport values for public routes and allowed
    /// anonymous requests, otherwise the transport values merged with the
    /// introspection result.
    pub async fn authenticate(&self, identity: Identity, endpoint: &str) -> Result<Identity, ServiceError> {
        if self.service.is_internal_call(&identity) {
            debug!(endpoint, "Internal call");
            return Ok(identity);
        }

        if self.service.is_public_route(endpoint) {
            debug!(endpoint, "Public route");
            return Ok(transport_only(&identity).build());
        }

        let token = match extract_bearer(identity.authorization()) {
            Ok(token) => token,
            Err(_) if self.anonymous == AnonymousAccess::Allow => {
                debug!(endpoint, "No bearer token, continuing anonymously");
                return Ok(transport_only(&identity).build());
            }
            Err(e) => {
                warn!(endpoint, "Missing or malformed bearer token");
                return Err(e);
            }
        };

        let response = self.introspector.token_info(token).await.map_err(|e| {
            warn!(endpoint, error = %e, "Token introspection failed");
            e
        })?;

        let identity = merge_token_info(&identity, response);
        self.service.authenticate(&identity, endpoint).await?;

        Ok(identity)
    }
}

impl std::fmt::Debug for RequestAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("service", &self.service)
            .field("anonymous", &self.anonymous)
            .finish_non_exhaustive()
    }
}

pub fn unauthenticated_error() -> ServiceError {
    ServiceError::unauthenticated("unauthenticated").with_name(UNAUTHENTICATED)
}

/// Token from an `Authorization` value of the form `Bearer <token>`
fn extract_bearer(authorization: &str) -> Result<&str, ServiceError> {
    match authorization.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() && !token.contains(BEARER_PREFIX) => Ok(token),
        _ => Err(unauthenticated_error()),
    }
}

/// Inbound values that say nothing about who the caller is
fn transport_only(identity: &Identity) -> IdentityBuilder {
    Identity::builder()
        .authorization(identity.authorization())
        .request_id(identity.request_id())
        .accept_language(identity.accept_language())
        .forwarded_for(identity.forwarded_for())
        .user_agent(identity.user_agent())
}

/// Caller fields from the introspection result over the inbound transport
/// values; a missing part leaves its fields empty
fn merge_token_info(identity: &Identity, response: TokenInfoResponse) -> Identity {
    let mut builder = transport_only(identity).scopes(response.scope);

    if let Some(info) = response.token_info {
        builder = builder
            .user_id(info.user_id)
            .user_name(info.user_name)
            .user_email(info.user_email)
            .user_type(info.user_type)
            .company_id(info.company_id)
            .company_name(info.company_name)
            .permissions(info.permissions);
    }
    if let Some(client) = response.client_info {
        builder = builder.client_id(client.client_id).client_name(client.client_name);
    }

    builder.build()
}
