//! Unified error taxonomy for Nova backend services
//!
//! Every error that crosses a service boundary is a [`ServiceError`]: one
//! value carrying an [`ErrorKind`] discriminant plus the shared fields
//! (application code, stable name, message, field violations).
//!
//! # Design Principles
//!
//! 1. **Portable identity**: `code` + `name` survive both wire forms; the
//!    message may be a synthesized summary
//! 2. **Two wire forms, one value**: [`grpc`] encodes `google.rpc` status
//!    details, [`http`] encodes the versioned JSON error body
//! 3. **Observability**: [`ServiceError::log`] picks a level per kind
//!
//! # Example
//! ```rust
//! use error_types::{ErrorFields, ServiceError};
//!
//! let mut fields = ErrorFields::new();
//! fields.insert("email".to_string(), "required".to_string());
//!
//! let error = ServiceError::bad_request_from_fields(fields).unwrap();
//! assert_eq!(error.message(), "required");
//! assert_eq!(error.http_status(), 400);
//! ```

use std::collections::BTreeMap;
use thiserror::Error;
use tonic::Code;

pub mod grpc;
pub mod http;

pub use grpc::{META_KEY_CODE, META_KEY_NAME};
pub use http::{http_status_from_code, ErrorMeta, ResponseError, RESPONSE_ERROR_STATUS};

/// Field name → violation message. Ordered so the summary message of a
/// multi-field error is deterministic.
pub type ErrorFields = BTreeMap<String, String>;

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Taxonomy category of an error, independent of transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    TooManyRequests,
    Unauthenticated,
    Unauthorized,
    InternalServer,
}

impl ErrorKind {
    /// gRPC status code this kind is sent as
    pub const fn grpc_code(self) -> Code {
        match self {
            Self::BadRequest => Code::InvalidArgument,
            Self::NotFound => Code::NotFound,
            Self::TooManyRequests => Code::ResourceExhausted,
            Self::Unauthenticated => Code::Unauthenticated,
            Self::Unauthorized => Code::PermissionDenied,
            Self::InternalServer => Code::Internal,
        }
    }

    /// HTTP status this kind is rendered with
    ///
    /// Always agrees with [`http_status_from_code`] applied to
    /// [`ErrorKind::grpc_code`], so an authorization denial is 403 on both
    /// paths.
    pub const fn http_status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::TooManyRequests => 429,
            Self::Unauthenticated => 401,
            Self::Unauthorized => 403,
            Self::InternalServer => 500,
        }
    }

    /// Classify a gRPC code; anything outside the taxonomy is an internal error
    pub fn from_grpc_code(code: Code) -> Self {
        match code {
            Code::InvalidArgument => Self::BadRequest,
            Code::NotFound => Self::NotFound,
            Code::ResourceExhausted => Self::TooManyRequests,
            Code::Unauthenticated => Self::Unauthenticated,
            Code::PermissionDenied => Self::Unauthorized,
            _ => Self::InternalServer,
        }
    }

    /// Default name used when an error is raised without one
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InternalServer => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// Core service error used across all Nova services
///
/// Fields are private; build with the kind constructors and the `with_*`
/// methods, read with the accessors.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ServiceError {
    kind: ErrorKind,
    code: i32,
    name: String,
    message: String,
    grpc_code: Code,
    http_status: u16,
    fields: ErrorFields,
    data: Option<serde_json::Value>,
}

impl ServiceError {
    /// Create an error of the given kind with the kind's wire codes
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: 0,
            name: String::new(),
            message: message.into(),
            grpc_code: kind.grpc_code(),
            http_status: kind.http_status(),
            fields: ErrorFields::new(),
            data: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooManyRequests, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServer, message)
    }

    /// Build a bad request from field violations
    ///
    /// Returns `None` when there is nothing to report. With more than one
    /// field the message becomes `"<first>. and there are N errors"` where
    /// `N` counts the remaining fields.
    pub fn bad_request_from_fields(fields: ErrorFields) -> Option<Self> {
        let (_, first) = fields.iter().next()?;
        let others = fields.len() - 1;
        let message = if others >= 1 {
            format!("{}. and there are {} errors", first, others)
        } else {
            first.clone()
        };
        Some(Self::bad_request(message).with_fields(fields))
    }

    /// Attach an application-defined error code
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = code;
        self
    }

    /// Attach a stable symbolic name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the field violations
    pub fn with_fields(mut self, fields: ErrorFields) -> Self {
        self.fields = fields;
        self
    }

    /// Add a single field violation
    pub fn with_field(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.fields.insert(field.into(), message.into());
        self
    }

    /// Attach an opaque in-process payload (never put on the wire)
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn grpc_code(&self) -> Code {
        self.grpc_code
    }

    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    pub fn fields(&self) -> &ErrorFields {
        &self.fields
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    pub fn is_kind(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn has_code(&self, code: i32) -> bool {
        self.code == code
    }

    /// Name to report to clients: the explicit name, or the kind default
    pub fn name_or_default(&self) -> &str {
        if self.name.is_empty() {
            self.kind.default_name()
        } else {
            &self.name
        }
    }

    /// Log error with appropriate level and context
    pub fn log(&self) {
        match self.kind {
            ErrorKind::BadRequest | ErrorKind::NotFound => {
                tracing::debug!(code = self.code, name = self.name_or_default(), error = %self, "Client error");
            }
            ErrorKind::Unauthenticated | ErrorKind::Unauthorized => {
                tracing::warn!(code = self.code, name = self.name_or_default(), error = %self, "Authorization failure");
            }
            ErrorKind::TooManyRequests => {
                tracing::info!(code = self.code, name = self.name_or_default(), error = %self, "Rate limit hit");
            }
            ErrorKind::InternalServer => {
                tracing::error!(
                    code = self.code,
                    name = self.name_or_default(),
                    grpc_code = ?self.grpc_code,
                    error = %self,
                    "Server error"
                );
            }
        }
    }

    /// Rebuild an error from decoded wire parts
    pub(crate) fn from_parts(
        grpc_code: Code,
        http_status: u16,
        code: i32,
        name: String,
        message: String,
        fields: ErrorFields,
    ) -> Self {
        Self {
            kind: ErrorKind::from_grpc_code(grpc_code),
            code,
            name,
            message,
            grpc_code,
            http_status,
            fields,
            data: None,
        }
    }
}
