//! Static authorization configuration
//!
//! Built once at startup, validated by [`crate::AuthService::new`] and never
//! mutated afterwards.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Startup configuration failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load auth configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("trusted user types contain a blank entry")]
    BlankTrustedUserType,

    #[error("{table} contains a blank route key")]
    BlankRouteKey { table: &'static str },

    #[error("{table} entry for route {route} contains a blank value")]
    BlankRequirement { table: &'static str, route: String },
}

/// Per-service authorization policy
///
/// Route keys are fully-qualified gRPC methods (`/orders.v1.Orders/Create`)
/// or HTTP endpoints (`[POST] /orders`).
///
/// ```toml
/// internal_call_secret = "s3cret"
/// trusted_user_types = ["ADMIN"]
/// public_routes = ["/orders.v1.Orders/List"]
///
/// [permission_routes]
/// "/orders.v1.Orders/Create" = ["orders:write"]
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret marking service-to-service calls as trusted
    pub internal_call_secret: Option<String>,

    /// User types that bypass every route check
    pub trusted_user_types: HashSet<String>,

    pub public_routes: HashSet<String>,

    pub user_type_routes: HashMap<String, Vec<String>>,

    pub permission_routes: HashMap<String, Vec<String>>,

    pub scope_routes: HashMap<String, Vec<String>>,
}

impl AuthConfig {
    /// Load from a TOML, YAML or JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.trusted_user_types.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::BlankTrustedUserType);
        }
        if self.public_routes.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::BlankRouteKey {
                table: "public_routes",
            });
        }

        for (table, routes) in [
            ("user_type_routes", &self.user_type_routes),
            ("permission_routes", &self.permission_routes),
            ("scope_routes", &self.scope_routes),
        ] {
            for (route, values) in routes {
                if route.trim().is_empty() {
                    return Err(ConfigError::BlankRouteKey { table });
                }
                if values.iter().any(|v| v.trim().is_empty()) {
                    return Err(ConfigError::BlankRequirement {
                        table,
                        route: route.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "internal_call_secret",
                &self.internal_call_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("trusted_user_types", &self.trusted_user_types)
            .field("public_routes", &self.public_routes)
            .field("user_type_routes", &self.user_type_routes)
            .field("permission_routes", &self.permission_routes)
            .field("scope_routes", &self.scope_routes)
            .finish()
    }
}
