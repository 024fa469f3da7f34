//! HTTP/JSON wire form of [`ServiceError`]
//!
//! Clients consume this body shape directly, so it is versioned with the API:
//!
//! ```json
//! {
//!   "status": "error",
//!   "message": "email is required",
//!   "meta": { "code": 42, "name": "X", "grpcCode": 3, "httpCode": 400 },
//!   "fields": { "email": "email is required" }
//! }
//! ```
//!
//! Zero codes, empty names and empty field maps are omitted.

use crate::{ErrorFields, ServiceError};
use serde::{Deserialize, Serialize};
use tonic::Code;

/// Value of the `status` member on every error body
pub const RESPONSE_ERROR_STATUS: &str = "error";

/// Standard HTTP error response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ErrorMeta>,

    #[serde(default, skip_serializing_if = "ErrorFields::is_empty")]
    pub fields: ErrorFields,
}

/// Portable identity of the error inside a [`ResponseError`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorMeta {
    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub code: i32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub grpc_code: i32,

    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub http_code: u16,
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_u16(value: &u16) -> bool {
    *value == 0
}

impl From<&ServiceError> for ResponseError {
    fn from(error: &ServiceError) -> Self {
        Self {
            status: RESPONSE_ERROR_STATUS.to_string(),
            message: error.message().to_string(),
            meta: Some(ErrorMeta {
                code: error.code(),
                name: error.name().to_string(),
                grpc_code: error.grpc_code() as i32,
                http_code: error.http_status(),
            }),
            fields: error.fields().clone(),
        }
    }
}

impl ServiceError {
    /// Render the JSON error body
    pub fn to_response_error(&self) -> ResponseError {
        ResponseError::from(self)
    }

    /// Reconstruct an error from a JSON error body
    ///
    /// Returns `None` when the body is not an error body: `status` other than
    /// `"error"` or no `meta`.
    pub fn from_response_error(response: &ResponseError) -> Option<Self> {
        if response.status != RESPONSE_ERROR_STATUS {
            return None;
        }
        let meta = response.meta.as_ref()?;

        let grpc_code = Code::from(meta.grpc_code);
        let http_status = if meta.http_code == 0 {
            http_status_from_code(grpc_code)
        } else {
            meta.http_code
        };

        Some(Self::from_parts(
            grpc_code,
            http_status,
            meta.code,
            meta.name.clone(),
            response.message.clone(),
            response.fields.clone(),
        ))
    }
}

/// HTTP status for any gRPC code
///
/// Used for every error crossing from gRPC to HTTP, including ones that
/// never belonged to the taxonomy.
pub fn http_status_from_code(code: Code) -> u16 {
    match code {
        Code::Ok => 200,
        Code::Cancelled => 499,
        Code::Unknown => 500,
        Code::InvalidArgument => 400,
        Code::DeadlineExceeded => 504,
        Code::NotFound => 404,
        Code::AlreadyExists => 409,
        Code::PermissionDenied => 403,
        Code::Unauthenticated => 401,
        Code::ResourceExhausted => 429,
        // Deliberately not 412 Precondition Failed
        Code::FailedPrecondition => 400,
        Code::Aborted => 409,
        Code::OutOfRange => 400,
        Code::Unimplemented => 501,
        Code::Internal => 500,
        Code::Unavailable => 503,
        Code::DataLoss => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_error_response_serialization() {
        let error = ServiceError::bad_request("email is required")
            .with_code(42)
            .with_name("X")
            .with_field("email", "email is required");

        let json = serde_json::to_value(error.to_response_error()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": "error",
                "message": "email is required",
                "meta": { "code": 42, "name": "X", "grpcCode": 3, "httpCode": 400 },
                "fields": { "email": "email is required" }
            })
        );
    }

    #[test]
    fn test_empty_members_are_omitted() {
        let json = serde_json::to_string(&ServiceError::internal("boom").to_response_error()).unwrap();

        assert_eq!(
            json,
            r#"{"status":"error","message":"boom","meta":{"grpcCode":13,"httpCode":500}}"#
        );
    }

    #[test]
    fn test_response_error_round_trip() {
        let error = ServiceError::too_many_requests("slow down")
            .with_code(9)
            .with_name("RATE_LIMITED");

        let body = serde_json::to_string(&error.to_response_error()).unwrap();
        let parsed: ResponseError = serde_json::from_str(&body).unwrap();
        let restored = ServiceError::from_response_error(&parsed).unwrap();

        assert_eq!(restored.kind(), ErrorKind::TooManyRequests);
        assert_eq!(restored.code(), 9);
        assert_eq!(restored.name(), "RATE_LIMITED");
        assert_eq!(restored.http_status(), 429);
    }

    #[test]
    fn test_non_error_body_is_rejected() {
        let body: ResponseError =
            serde_json::from_str(r#"{"status":"ok","message":"fine","meta":{"code":1}}"#).unwrap();
        assert!(ServiceError::from_response_error(&body).is_none());

        let body: ResponseError = serde_json::from_str(r#"{"status":"error","message":"x"}"#).unwrap();
        assert!(ServiceError::from_response_error(&body).is_none());
    }

    #[test]
    fn test_missing_http_code_falls_back_to_table() {
        let body: ResponseError =
            serde_json::from_str(r#"{"status":"error","message":"gone","meta":{"grpcCode":14}}"#)
                .unwrap();

        let restored = ServiceError::from_response_error(&body).unwrap();
        assert_eq!(restored.kind(), ErrorKind::InternalServer);
        assert_eq!(restored.http_status(), 503);
    }

    #[test]
    fn test_http_status_from_code_table() {
        assert_eq!(http_status_from_code(Code::Ok), 200);
        assert_eq!(http_status_from_code(Code::Cancelled), 499);
        assert_eq!(http_status_from_code(Code::DeadlineExceeded), 504);
        assert_eq!(http_status_from_code(Code::AlreadyExists), 409);
        assert_eq!(http_status_from_code(Code::FailedPrecondition), 400);
        assert_eq!(http_status_from_code(Code::Unimplemented), 501);
        assert_eq!(http_status_from_code(Code::DataLoss), 500);
    }
}
