//! gRPC wire form of [`ServiceError`]
//!
//! Errors travel as a `tonic::Status` whose binary details hold a
//! `google.rpc.Status` with:
//! - `google.rpc.ErrorInfo`, metadata `{"Code": "<int>", "name": "<name>"}`
//! - `google.rpc.BadRequest`, one field violation per entry in `fields`
//!
//! Peers in other languages decode the same detail messages, so the keys and
//! type URLs (supplied by `tonic-types`) are a fixed contract.

use crate::http::http_status_from_code;
use crate::{ErrorFields, ServiceError};
use std::collections::HashMap;
use tonic::Status;
use tonic_types::{ErrorDetails, StatusExt};

/// ErrorInfo metadata key carrying the application error code
pub const META_KEY_CODE: &str = "Code";

/// ErrorInfo metadata key carrying the error name
pub const META_KEY_NAME: &str = "name";

impl ServiceError {
    /// Convert to gRPC Status for service boundaries
    pub fn to_status(&self) -> Status {
        let mut details = ErrorDetails::new();
        let mut has_details = false;

        let mut metadata = HashMap::new();
        if self.code() != 0 {
            metadata.insert(META_KEY_CODE.to_string(), self.code().to_string());
        }
        if !self.name().is_empty() {
            metadata.insert(META_KEY_NAME.to_string(), self.name().to_string());
        }
        if !metadata.is_empty() {
            details.set_error_info("", "", metadata);
            has_details = true;
        }

        for (field, description) in self.fields() {
            details.add_bad_request_violation(field.as_str(), description.as_str());
            has_details = true;
        }

        if !has_details {
            return Status::new(self.grpc_code(), self.message());
        }

        Status::with_error_details(self.grpc_code(), self.message(), details)
    }

    /// Reconstruct an error received from a gRPC peer
    ///
    /// Codes outside the taxonomy become [`crate::ErrorKind::InternalServer`]
    /// while keeping the original gRPC code; the HTTP status follows
    /// [`http_status_from_code`]. Undecodable details are ignored.
    pub fn from_status(status: &Status) -> Self {
        let mut code = 0;
        let mut name = String::new();
        let mut fields = ErrorFields::new();

        if !status.details().is_empty() {
            match status.check_error_details() {
                Ok(details) => {
                    if let Some(info) = details.error_info() {
                        if let Some(parsed) = info
                            .metadata
                            .get(META_KEY_CODE)
                            .and_then(|c| c.parse().ok())
                        {
                            code = parsed;
                        }
                        if let Some(value) = info.metadata.get(META_KEY_NAME) {
                            name = value.clone();
                        }
                    }
                    if let Some(bad_request) = details.bad_request() {
                        fields.extend(
                            bad_request
                                .field_violations
                                .iter()
                                .map(|v| (v.field.clone(), v.description.clone())),
                        );
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring undecodable status details");
                }
            }
        }

        Self::from_parts(
            status.code(),
            http_status_from_code(status.code()),
            code,
            name,
            status.message().to_string(),
            fields,
        )
    }
}

impl From<ServiceError> for Status {
    fn from(error: ServiceError) -> Self {
        error.to_status()
    }
}

impl From<&ServiceError> for Status {
    fn from(error: &ServiceError) -> Self {
        error.to_status()
    }
}

impl From<Status> for ServiceError {
    fn from(status: Status) -> Self {
        Self::from_status(&status)
    }
}
