//! Outcome types for identity membership checks

use error_types::{ErrorKind, ServiceError};
use std::collections::HashSet;

/// Non-failing result of a membership check
///
/// `NotApplicable` means the rule had nothing to check (empty requirement
/// set). It is not a denial, and it is not a grant either: callers continue
/// with the next rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Granted,
    NotApplicable,
}

impl RuleOutcome {
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Which check denied the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    UserType,
    Permission,
    Scope,
}

impl DenialReason {
    /// Stable error name; survives both wire forms
    pub const fn error_name(self) -> &'static str {
        match self {
            Self::UserType => "UNAUTHORIZED_USER_TYPE",
            Self::Permission => "UNAUTHORIZED_PERMISSION",
            Self::Scope => "UNAUTHORIZED_SCOPE",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::UserType => "user type",
            Self::Permission => "permission",
            Self::Scope => "scope",
        }
    }

    /// Unauthorized error tagged with this reason
    pub fn to_error(self) -> ServiceError {
        ServiceError::unauthorized(format!("unauthorized: {}", self.label()))
            .with_name(self.error_name())
    }

    /// Recover the reason from an error, including one rebuilt from the wire
    pub fn from_error(error: &ServiceError) -> Option<Self> {
        if !error.is_kind(ErrorKind::Unauthorized) {
            return None;
        }
        [Self::UserType, Self::Permission, Self::Scope]
            .into_iter()
            .find(|reason| error.has_name(reason.error_name()))
    }
}

/// Granted iff `held ∩ required ≠ ∅`; not applicable iff `required` is empty
pub(crate) fn check_membership<I, S>(
    held: HashSet<&str>,
    required: I,
    reason: DenialReason,
) -> Result<RuleOutcome, ServiceError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut any_required = false;
    for code in required {
        any_required = true;
        if held.contains(code.as_ref()) {
            return Ok(RuleOutcome::Granted);
        }
    }

    if any_required {
        Err(reason.to_error())
    } else {
        Ok(RuleOutcome::NotApplicable)
    }
}
