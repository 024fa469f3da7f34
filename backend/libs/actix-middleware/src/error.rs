use actix_web::http::header::{HeaderValue, WWW_AUTHENTICATE};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use error_types::{ErrorKind, ServiceError};

/// Render `error` as the standard JSON error body
///
/// Unauthenticated responses carry `WWW-Authenticate: Bearer`.
pub fn error_response(error: &ServiceError) -> HttpResponse {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = HttpResponse::build(status).json(error.to_response_error());
    if error.is_kind(ErrorKind::Unauthenticated) {
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    response
}

/// `actix_web::Error` that renders as [`error_response`]
pub(crate) fn into_actix_error(error: ServiceError) -> actix_web::Error {
    let response = error_response(&error);
    actix_web::error::InternalError::from_response(error, response).into()
}
