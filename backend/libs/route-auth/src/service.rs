//! Authorization engine
//!
//! Answers "may this identity call this endpoint" from the static
//! [`AuthConfig`] plus an optional [`RouteConfigProvider`]. Token handling
//! lives in [`crate::RequestAuthenticator`]; this type only sees identities.

use crate::config::{AuthConfig, ConfigError};
use crate::{RouteConfigProvider, RouteRequirement};
use error_types::ServiceError;
use request_context::Identity;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// gRPC health endpoints, always public
pub const HEALTH_CHECK_ROUTES: [&str; 2] = [
    "/grpc.health.v1.Health/Check",
    "/grpc.health.v1.Health/Watch",
];

pub struct AuthService {
    internal_call_secret: Option<String>,
    trusted_user_types: HashSet<String>,
    public_routes: HashSet<String>,
    user_type_routes: HashMap<String, Vec<String>>,
    permission_routes: HashMap<String, Vec<String>>,
    scope_routes: HashMap<String, Vec<String>>,
    provider: Option<Arc<dyn RouteConfigProvider>>,
}

impl AuthService {
    /// Validate `config` and build the engine
    ///
    /// Health-check routes are added to the public set.
    pub fn new(
        config: AuthConfig,
        provider: Option<Arc<dyn RouteConfigProvider>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let AuthConfig {
            internal_call_secret,
            trusted_user_types,
            mut public_routes,
            user_type_routes,
            permission_routes,
            scope_routes,
        } = config;

        public_routes.extend(HEALTH_CHECK_ROUTES.iter().map(|r| r.to_string()));

        Ok(Self {
            internal_call_secret: internal_call_secret.filter(|s| !s.is_empty()),
            trusted_user_types,
            public_routes,
            user_type_routes,
            permission_routes,
            scope_routes,
            provider,
        })
    }

    pub fn is_public_route(&self, endpoint: &str) -> bool {
        self.public_routes.contains(endpoint)
    }

    /// Check if the caller presented this service's internal-call secret
    ///
    /// Always false when no secret is configured.
    pub fn is_internal_call(&self, identity: &Identity) -> bool {
        match &self.internal_call_secret {
            Some(secret) => identity.internal_call_secret() == secret,
            None => false,
        }
    }

    /// Static requirements for `endpoint`
    pub fn requirements(&self, endpoint: &str) -> RouteRequirement {
        let lookup = |table: &HashMap<String, Vec<String>>| {
            table
                .get(endpoint)
                .map(|values| values.iter().cloned().collect())
                .unwrap_or_default()
        };

        RouteRequirement {
            user_types: lookup(&self.user_type_routes),
            permissions: lookup(&self.permission_routes),
            scopes: lookup(&self.scope_routes),
        }
    }

    /// Decide whether `identity` may call `endpoint`
    ///
    /// Provider errors and the veto are returned unchanged. Denials are
    /// Unauthorized errors whose name carries the [`request_context::DenialReason`].
    pub async fn authenticate(&self, identity: &Identity, endpoint: &str) -> Result<(), ServiceError> {
        let mut requirement = self.requirements(endpoint);

        if let Some(provider) = &self.provider {
            if let Some(dynamic) = provider.route_config(endpoint).await? {
                requirement.merge(dynamic);
            }
            provider.check_route_permission(endpoint, identity).await?;
        }

        if identity.has_user_type_by_map_code(&self.trusted_user_types) || self.is_internal_call(identity) {
            debug!(endpoint, user_type = identity.user_type(), "Trusted caller allowed");
            return Ok(());
        }

        let result = self.check_requirement(identity, &requirement);
        match &result {
            Ok(()) => debug!(endpoint, user_id = identity.user_id(), "Caller authorized"),
            Err(e) => warn!(
                endpoint,
                user_id = identity.user_id(),
                reason = e.name(),
                "Caller denied"
            ),
        }
        result
    }

    fn check_requirement(&self, identity: &Identity, requirement: &RouteRequirement) -> Result<(), ServiceError> {
        // A matching user type skips the permission and scope checks
        if identity.has_user_type(&requirement.user_types)?.is_granted() {
            return Ok(());
        }

        identity.has_permission(&requirement.permissions)?;
        identity.has_scope(&requirement.scopes)?;
        Ok(())
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("trusted_user_types", &self.trusted_user_types)
            .field("public_routes", &self.public_routes.len())
            .field("has_provider", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}
