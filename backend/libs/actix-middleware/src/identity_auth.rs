use crate::error::into_actix_error;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ready, Ready};
use request_context::{Identity, MetadataCarrier};
use route_auth::{AnonymousAccess, RequestAuthenticator};
use std::collections::BTreeMap;
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;
use std::rc::Rc;

/// Verified caller stored by [`IdentityAuthMiddleware`]
#[derive(Debug, Clone)]
pub struct Caller(pub Identity);

impl Deref for Caller {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HttpAuthConfig {
    /// Let requests without a usable bearer token through; GraphQL
    /// resolvers enforce authentication themselves
    pub graphql_mode: bool,
}

/// Route authorization middleware
///
/// The endpoint key is `[METHOD] /path`, e.g. `[POST] /orders`.
pub struct IdentityAuthMiddleware {
    authenticator: RequestAuthenticator,
}

impl IdentityAuthMiddleware {
    pub fn new(authenticator: RequestAuthenticator, config: HttpAuthConfig) -> Self {
        let anonymous = if config.graphql_mode {
            AnonymousAccess::Allow
        } else {
            AnonymousAccess::Deny
        };

        Self {
            authenticator: authenticator.with_anonymous_access(anonymous),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for IdentityAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = IdentityAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(IdentityAuthMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct IdentityAuthMiddlewareService<S> {
    service: Rc<S>,
    authenticator: RequestAuthenticator,
}

impl<S, B> Service<ServiceRequest> for IdentityAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            let endpoint = endpoint_key(req.method().as_str(), req.path());
            let inbound = Identity::from_metadata(&header_dictionary(&req));

            let identity = authenticator
                .authenticate(inbound, &endpoint)
                .await
                .map_err(|e| {
                    e.log();
                    into_actix_error(e)
                })?;

            req.extensions_mut().insert(Caller(identity));

            service.call(req).await
        })
    }
}

/// Route key for an HTTP request; the query string is not part of it
pub fn endpoint_key(method: &str, path: &str) -> String {
    format!("[{}] {}", method, path)
}

/// Request headers as a case-insensitive dictionary; the last value wins
fn header_dictionary(req: &ServiceRequest) -> BTreeMap<String, String> {
    let mut dict = BTreeMap::new();
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            dict.set_value(name.as_str(), value);
        }
    }
    dict
}

/// FromRequest implementation for Caller
impl actix_web::FromRequest for Caller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<Caller>() {
            Some(caller) => ready(Ok(caller.clone())),
            None => ready(Err(into_actix_error(route_auth::unauthenticated_error()))),
        }
    }
}
