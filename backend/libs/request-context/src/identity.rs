//! Identity Structure and Authorization Helpers
//!
//! An [`Identity`] is built once per inbound request, either from inherited
//! metadata or from a token-introspection result, and stored in request
//! extensions for handlers. It never changes afterwards: every
//! transformation goes through [`Identity::to_builder`] and yields a new
//! value.

use crate::carrier::MetadataCarrier;
use crate::keys;
use crate::rules::{check_membership, DenialReason, RuleOutcome};
use crate::{PERMISSION_SEPARATOR, SCOPE_SEPARATOR};
use error_types::ServiceError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tonic::metadata::MetadataMap;

/// Who is calling
///
/// ## Design Notes
///
/// - Fields are private; accessors return borrowed strings
/// - Cloneable and `Send + Sync`, so concurrent downstream calls for the
///   same request can each hold a copy
/// - `Debug` redacts the bearer value and the internal-call secret, and
///   neither is serialized
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    user_id: String,
    user_name: String,
    user_email: String,
    user_type: String,
    company_id: String,
    company_name: String,
    client_id: String,
    client_name: String,
    permissions: String,
    scopes: String,
    #[serde(default, skip_serializing)]
    internal_call_secret: String,
    #[serde(default, skip_serializing)]
    authorization: String,
    request_id: String,
    accept_language: String,
    forwarded_for: String,
    user_agent: String,
}

impl Identity {
    pub fn builder() -> IdentityBuilder {
        IdentityBuilder::default()
    }

    /// Start a new identity from this one
    pub fn to_builder(&self) -> IdentityBuilder {
        IdentityBuilder {
            inner: self.clone(),
        }
    }

    /// Read the fixed key set; missing keys leave the field empty
    pub fn from_metadata<C: MetadataCarrier + ?Sized>(carrier: &C) -> Self {
        let get = |key: &str| carrier.get_value(key).unwrap_or_default().to_string();

        Self {
            user_id: get(keys::USER_ID),
            user_name: get(keys::USER_NAME),
            user_email: get(keys::USER_EMAIL),
            user_type: get(keys::USER_TYPE),
            company_id: get(keys::COMPANY_ID),
            company_name: get(keys::COMPANY_NAME),
            client_id: get(keys::CLIENT_ID),
            client_name: get(keys::CLIENT_NAME),
            permissions: get(keys::PERMISSIONS),
            scopes: get(keys::SCOPES),
            internal_call_secret: get(keys::INTERNAL_CALL_PASSWORD),
            authorization: get(keys::AUTHORIZATION),
            request_id: get(keys::REQUEST_ID),
            accept_language: get(keys::ACCEPT_LANGUAGE),
            forwarded_for: get(keys::FORWARDED_FOR),
            user_agent: get(keys::USER_AGENT),
        }
    }

    /// Write the fixed key set, replacing whatever the carrier held
    pub fn write_metadata<C: MetadataCarrier + ?Sized>(&self, carrier: &mut C) {
        for (key, value) in self.entries() {
            carrier.set_value(key, value);
        }
    }

    /// Fresh gRPC metadata holding exactly this identity
    pub fn to_metadata(&self) -> MetadataMap {
        let mut metadata = MetadataMap::new();
        self.write_metadata(&mut metadata);
        metadata
    }

    /// Metadata for an outbound service-to-service call
    ///
    /// A non-empty `override_secret` replaces this identity's own
    /// internal-call secret, letting a service assert its own trust while
    /// forwarding a user.
    pub fn propagate(&self, override_secret: Option<&str>) -> MetadataMap {
        let mut metadata = MetadataMap::new();
        self.propagate_into(&mut metadata, override_secret);
        metadata
    }

    /// [`Identity::propagate`] into an existing carrier
    pub fn propagate_into<C: MetadataCarrier + ?Sized>(
        &self,
        carrier: &mut C,
        override_secret: Option<&str>,
    ) {
        let secret = override_secret
            .filter(|s| !s.is_empty())
            .unwrap_or(self.internal_call_secret.as_str());

        for (key, value) in self.entries() {
            if key == keys::INTERNAL_CALL_PASSWORD {
                carrier.set_value(key, secret);
            } else {
                carrier.set_value(key, value);
            }
        }
    }

    fn entries(&self) -> [(&'static str, &str); 16] {
        [
            (keys::USER_ID, self.user_id.as_str()),
            (keys::USER_NAME, self.user_name.as_str()),
            (keys::USER_EMAIL, self.user_email.as_str()),
            (keys::USER_TYPE, self.user_type.as_str()),
            (keys::COMPANY_ID, self.company_id.as_str()),
            (keys::COMPANY_NAME, self.company_name.as_str()),
            (keys::PERMISSIONS, self.permissions.as_str()),
            (keys::SCOPES, self.scopes.as_str()),
            (keys::CLIENT_ID, self.client_id.as_str()),
            (keys::CLIENT_NAME, self.client_name.as_str()),
            (keys::INTERNAL_CALL_PASSWORD, self.internal_call_secret.as_str()),
            (keys::AUTHORIZATION, self.authorization.as_str()),
            (keys::REQUEST_ID, self.request_id.as_str()),
            (keys::ACCEPT_LANGUAGE, self.accept_language.as_str()),
            (keys::FORWARDED_FOR, self.forwarded_for.as_str()),
            (keys::USER_AGENT, self.user_agent.as_str()),
        ]
    }

    /// Placeholder service identity for work without an inbound caller
    /// (background jobs, fixtures)
    pub fn internal_dummy(secret: Option<&str>) -> Self {
        Self {
            user_id: "DummyUserID".to_string(),
            user_name: "DummyUserName".to_string(),
            user_email: "DummyUserEmail".to_string(),
            user_type: "DummyUserType".to_string(),
            company_id: "DummyCompanyID".to_string(),
            company_name: "DummyCompanyName".to_string(),
            client_id: "DummyClientID".to_string(),
            client_name: "DummyClientName".to_string(),
            permissions: "DummyPermissions".to_string(),
            scopes: "*".to_string(),
            internal_call_secret: secret.unwrap_or_default().to_string(),
            ..Default::default()
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn user_type(&self) -> &str {
        &self.user_type
    }

    pub fn company_id(&self) -> &str {
        &self.company_id
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Raw `;`-joined permission value
    pub fn permissions_raw(&self) -> &str {
        &self.permissions
    }

    /// Raw space-joined scope value
    pub fn scopes_raw(&self) -> &str {
        &self.scopes
    }

    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions
            .split(PERMISSION_SEPARATOR)
            .filter(|p| !p.is_empty())
    }

    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scopes.split(SCOPE_SEPARATOR).filter(|s| !s.is_empty())
    }

    pub fn internal_call_secret(&self) -> &str {
        &self.internal_call_secret
    }

    /// Raw `Authorization` value, including the `Bearer ` prefix
    pub fn authorization(&self) -> &str {
        &self.authorization
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn accept_language(&self) -> &str {
        &self.accept_language
    }

    /// Caller's language, or `default` when none was sent
    pub fn accept_language_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.accept_language.is_empty() {
            default
        } else {
            &self.accept_language
        }
    }

    pub fn forwarded_for(&self) -> &str {
        &self.forwarded_for
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Check if any of `required` is among the caller's permissions
    ///
    /// Returns `NotApplicable` for an empty requirement; a miss is an
    /// Unauthorized error named `UNAUTHORIZED_PERMISSION`.
    pub fn has_permission<I, S>(&self, required: I) -> Result<RuleOutcome, ServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_membership(
            self.permissions().collect(),
            required,
            DenialReason::Permission,
        )
    }

    /// Scope counterpart of [`Identity::has_permission`]
    pub fn has_scope<I, S>(&self, required: I) -> Result<RuleOutcome, ServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_membership(self.scopes().collect(), required, DenialReason::Scope)
    }

    /// User-type counterpart of [`Identity::has_permission`]
    pub fn has_user_type<I, S>(&self, required: I) -> Result<RuleOutcome, ServiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let held: HashSet<&str> = std::iter::once(self.user_type.as_str())
            .filter(|t| !t.is_empty())
            .collect();
        check_membership(held, required, DenialReason::UserType)
    }

    /// Check if the caller's user type is in a trusted set
    pub fn has_user_type_by_map_code(&self, trusted: &HashSet<String>) -> bool {
        !self.user_type.is_empty() && trusted.contains(&self.user_type)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &str| if value.is_empty() { "" } else { "<redacted>" };

        f.debug_struct("Identity")
            .field("user_id", &self.user_id)
            .field("user_type", &self.user_type)
            .field("company_id", &self.company_id)
            .field("client_id", &self.client_id)
            .field("permissions", &self.permissions)
            .field("scopes", &self.scopes)
            .field("internal_call_secret", &redact(&self.internal_call_secret))
            .field("authorization", &redact(&self.authorization))
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Identity`]
#[derive(Debug, Clone, Default)]
pub struct IdentityBuilder {
    inner: Identity,
}

macro_rules! setters {
    ($($field:ident),* $(,)?) => {
        $(
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.inner.$field = value.into();
                self
            }
        )*
    };
}

impl IdentityBuilder {
    setters!(
        user_id,
        user_name,
        user_email,
        user_type,
        company_id,
        company_name,
        client_id,
        client_name,
        scopes,
        internal_call_secret,
        authorization,
        request_id,
        accept_language,
        forwarded_for,
        user_agent,
    );

    /// Set permissions from a list, joined with `;`
    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.inner.permissions = permissions
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(PERMISSION_SEPARATOR.to_string().as_str());
        self
    }

    pub fn build(self) -> Identity {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_types::ErrorKind;
    use std::collections::BTreeMap;

    fn orders_reader() -> Identity {
        Identity::builder()
            .user_id("u-1")
            .user_type("CUSTOMER")
            .permissions(["orders:read"])
            .scopes("orders openid")
            .build()
    }

    #[test]
    fn test_missing_keys_yield_empty_fields() {
        let identity = Identity::from_metadata(&MetadataMap::new());
        assert_eq!(identity, Identity::default());
    }

    #[test]
    fn test_has_permission_intersection() {
        let identity = Identity::builder()
            .permissions(["orders:read", "orders:write"])
            .build();

        assert_eq!(identity.permissions_raw(), "orders:read;orders:write");
        assert_eq!(
            identity.has_permission(["orders:write"]).unwrap(),
            RuleOutcome::Granted
        );
        assert_eq!(
            identity.has_permission(["billing:read", "orders:read"]).unwrap(),
            RuleOutcome::Granted
        );
    }

    #[test]
    fn test_has_permission_denied() {
        let error = orders_reader().has_permission(["orders:write"]).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Unauthorized);
        assert_eq!(DenialReason::from_error(&error), Some(DenialReason::Permission));
    }

    #[test]
    fn test_empty_requirements_are_not_applicable() {
        let identity = orders_reader();
        let none: [&str; 0] = [];

        assert_eq!(identity.has_permission(none).unwrap(), RuleOutcome::NotApplicable);
        assert_eq!(identity.has_scope(none).unwrap(), RuleOutcome::NotApplicable);
        assert_eq!(identity.has_user_type(none).unwrap(), RuleOutcome::NotApplicable);
    }

    #[test]
    fn test_identity_without_permissions_is_denied() {
        let error = Identity::default().has_permission(["orders:read"]).unwrap_err();
        assert_eq!(error.name(), "UNAUTHORIZED_PERMISSION");
    }

    #[test]
    fn test_has_scope_splits_on_space() {
        let identity = orders_reader();

        assert!(identity.has_scope(["openid"]).unwrap().is_granted());
        assert_eq!(
            identity.has_scope(["orders:write"]).unwrap_err().name(),
            "UNAUTHORIZED_SCOPE"
        );
    }

    #[test]
    fn test_has_user_type() {
        let identity = orders_reader();

        assert!(identity.has_user_type(["ADMIN", "CUSTOMER"]).unwrap().is_granted());
        assert_eq!(
            identity.has_user_type(["ADMIN"]).unwrap_err().name(),
            "UNAUTHORIZED_USER_TYPE"
        );
        assert!(Identity::default().has_user_type([""]).is_err());
    }

    #[test]
    fn test_has_user_type_by_map_code() {
        let trusted: HashSet<String> = ["ADMIN".to_string()].into_iter().collect();

        let admin = Identity::builder().user_type("ADMIN").build();
        assert!(admin.has_user_type_by_map_code(&trusted));
        assert!(!orders_reader().has_user_type_by_map_code(&trusted));
        assert!(!Identity::default().has_user_type_by_map_code(&trusted));
    }

    #[test]
    fn test_to_builder_leaves_original_untouched() {
        let original = orders_reader();
        let changed = original.to_builder().request_id("req-9").build();

        assert_eq!(original.request_id(), "");
        assert_eq!(changed.request_id(), "req-9");
        assert_eq!(changed.user_id(), original.user_id());
    }

    #[test]
    fn test_propagate_override_secret_wins() {
        let identity = Identity::builder()
            .user_id("u-1")
            .internal_call_secret("caller-secret")
            .build();

        let own = identity.propagate(None);
        assert_eq!(
            own.get(keys::INTERNAL_CALL_PASSWORD).unwrap().to_str().unwrap(),
            "caller-secret"
        );

        let overridden = identity.propagate(Some("service-secret"));
        assert_eq!(
            overridden.get(keys::INTERNAL_CALL_PASSWORD).unwrap().to_str().unwrap(),
            "service-secret"
        );

        let empty_override = identity.propagate(Some(""));
        assert_eq!(
            empty_override.get(keys::INTERNAL_CALL_PASSWORD).unwrap().to_str().unwrap(),
            "caller-secret"
        );
    }

    #[test]
    fn test_propagate_into_replaces_existing_values() {
        let mut carrier = BTreeMap::new();
        carrier.insert("UserID".to_string(), "stale".to_string());
        carrier.insert("x-trace".to_string(), "t-1".to_string());

        orders_reader().propagate_into(&mut carrier, None);

        assert_eq!(carrier.get_value(keys::USER_ID), Some("u-1"));
        assert_eq!(carrier.get("x-trace").map(String::as_str), Some("t-1"));
        assert!(!carrier.contains_key("UserID"));
    }

    #[test]
    fn test_internal_dummy() {
        let identity = Identity::internal_dummy(Some("s3cret"));

        assert_eq!(identity.user_id(), "DummyUserID");
        assert_eq!(identity.scopes_raw(), "*");
        assert_eq!(identity.internal_call_secret(), "s3cret");
        assert_eq!(Identity::internal_dummy(None).internal_call_secret(), "");
    }

    #[test]
    fn test_accept_language_or() {
        assert_eq!(Identity::default().accept_language_or("en"), "en");

        let identity = Identity::builder().accept_language("id").build();
        assert_eq!(identity.accept_language_or("en"), "id");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let identity = Identity::builder()
            .authorization("Bearer abc")
            .internal_call_secret("s3cret")
            .build();

        let debug = format!("{:?}", identity);
        assert!(!debug.contains("abc"));
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_serde_round_trip() {
        let identity = orders_reader();
        let json = serde_json::to_string(&identity).unwrap();
        let restored: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, identity);
    }

    #[test]
    fn test_serialize_omits_credentials() {
        let identity = orders_reader()
            .to_builder()
            .authorization("Bearer abc")
            .internal_call_secret("s3cret")
            .build();

        let json = serde_json::to_string(&identity).unwrap();
        assert!(!json.contains("abc"));
        assert!(!json.contains("s3cret"));

        let restored: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.authorization(), "");
        assert_eq!(restored.internal_call_secret(), "");
        assert_eq!(restored.user_id(), "u-1");
    }
}
