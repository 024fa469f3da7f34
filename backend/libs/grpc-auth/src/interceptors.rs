//! Inbound metadata normalization
//!
//! Plain function interceptors, usable with `Server::builder().layer(
//! tonic::service::interceptor(..))` or `XServer::with_interceptor`.

use chrono::Utc;
use request_context::{keys, MetadataCarrier};
use tonic::{Request, Status};
use uuid::Uuid;

/// Accept-Language as forwarded by grpc-gateway
pub const GATEWAY_ACCEPT_LANGUAGE: &str = "grpcgateway-accept-language";

/// Assign a request id when the caller did not send one
///
/// Format: `<uuid-v4>-<unix seconds>`.
pub fn request_id_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    let metadata = request.metadata_mut();
    if metadata.get_value(keys::REQUEST_ID).map_or(true, str::is_empty) {
        let request_id = format!("{}-{}", Uuid::new_v4(), Utc::now().timestamp());
        metadata.set_value(keys::REQUEST_ID, &request_id);
    }
    Ok(request)
}

/// Copy the gateway's Accept-Language into `accept-language`
pub fn accept_language_interceptor(mut request: Request<()>) -> Result<Request<()>, Status> {
    let metadata = request.metadata_mut();
    if let Some(language) = metadata
        .get_value(GATEWAY_ACCEPT_LANGUAGE)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
    {
        metadata.set_value(keys::ACCEPT_LANGUAGE, &language);
    }
    Ok(request)
}
