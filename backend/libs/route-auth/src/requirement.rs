use std::collections::BTreeSet;

/// What an endpoint demands of its caller
///
/// Each set is "any of": the caller needs one matching user type, one
/// matching permission, one matching scope. An empty set is not applicable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    pub user_types: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
    pub scopes: BTreeSet<String>,
}

impl RouteRequirement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user_types<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_types.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_permissions<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_scopes<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.extend(values.into_iter().map(Into::into));
        self
    }

    /// Union with another requirement; never replaces
    pub fn merge(&mut self, other: RouteRequirement) {
        self.user_types.extend(other.user_types);
        self.permissions.extend(other.permissions);
        self.scopes.extend(other.scopes);
    }

    pub fn is_empty(&self) -> bool {
        self.user_types.is_empty() && self.permissions.is_empty() && self.scopes.is_empty()
    }
}
