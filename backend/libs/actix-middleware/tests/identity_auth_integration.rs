use actix_middleware::{Caller, HttpAuthConfig, IdentityAuthMiddleware};
use actix_web::http::StatusCode;
use actix_web::{test, web, App, HttpResponse};
use async_trait::async_trait;
use error_types::ServiceError;
use route_auth::{
    AuthConfig, AuthService, ClientInfo, RequestAuthenticator, TokenInfo, TokenInfoResponse,
    TokenIntrospector,
};
use std::sync::Arc;

/// `tok-admin` is an ADMIN, `tok-reader` may only read orders,
/// `client-cred` carries no user
struct StaticIntrospector;

#[async_trait]
impl TokenIntrospector for StaticIntrospector {
    async fn token_info(&self, bearer: &str) -> Result<TokenInfoResponse, ServiceError> {
        if bearer == "client-cred" {
            return Ok(TokenInfoResponse {
                token_info: None,
                client_info: Some(ClientInfo {
                    client_id: "batch".to_string(),
                    client_name: "Batch".to_string(),
                }),
                scope: String::new(),
            });
        }

        let (user_type, permissions) = match bearer {
            "tok-admin" => ("ADMIN", vec![]),
            "tok-reader" => ("CUSTOMER", vec!["orders:read".to_string()]),
            _ => return Err(ServiceError::unauthenticated("invalid token").with_name("INVALID_TOKEN")),
        };

        Ok(TokenInfoResponse {
            token_info: Some(TokenInfo {
                user_id: format!("user-{}", bearer),
                user_type: user_type.to_string(),
                permissions,
                ..Default::default()
            }),
            client_info: None,
            scope: String::new(),
        })
    }
}

fn middleware(config: HttpAuthConfig) -> IdentityAuthMiddleware {
    let mut auth = AuthConfig {
        trusted_user_types: ["ADMIN".to_string()].into_iter().collect(),
        public_routes: ["[GET] /status".to_string()].into_iter().collect(),
        ..Default::default()
    };
    auth.permission_routes
        .insert("[POST] /orders".to_string(), vec!["orders:write".to_string()]);
    auth.scope_routes
        .insert("[POST] /orders".to_string(), vec!["orders:write".to_string()]);

    let service = AuthService::new(auth, None).expect("valid config");
    let authenticator = RequestAuthenticator::new(Arc::new(service), Arc::new(StaticIntrospector));
    IdentityAuthMiddleware::new(authenticator, config)
}

async fn whoami(caller: Caller) -> HttpResponse {
    HttpResponse::Ok().body(caller.user_id().to_string())
}

async fn claims(caller: Caller) -> HttpResponse {
    HttpResponse::Ok().body(format!("{}|{}", caller.user_type(), caller.user_id()))
}

async fn status() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

macro_rules! app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .wrap(middleware($config))
                .route("/status", web::get().to(status))
                .route("/orders", web::post().to(whoami))
                .route("/orders", web::get().to(whoami))
                .route("/claims", web::post().to(claims)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_public_route_without_token() {
    let app = app!(HttpAuthConfig::default());

    let req = test::TestRequest::get().uri("/status?verbose=1").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_missing_token_is_401_with_challenge() {
    let app = app!(HttpAuthConfig::default());

    let req = test::TestRequest::post().uri("/orders").to_request();
    let err = test::try_call_service(&app, req).await.err().expect("rejected");
    let resp = err.error_response();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.headers().get("www-authenticate").unwrap(), "Bearer");

    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["meta"]["name"], "UNAUTHENTICATED");
    assert_eq!(json["meta"]["grpcCode"], 16);
    assert_eq!(json["meta"]["httpCode"], 401);
}

#[actix_web::test]
async fn test_trusted_admin_passes_without_scopes() {
    let app = app!(HttpAuthConfig::default());

    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("Authorization", "Bearer tok-admin"))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, "user-tok-admin");
}

#[actix_web::test]
async fn test_missing_permission_is_403() {
    let app = app!(HttpAuthConfig::default());

    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("Authorization", "Bearer tok-reader"))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().expect("denied");
    let resp = err.error_response();

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(resp.headers().get("www-authenticate").is_none());

    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["meta"]["name"], "UNAUTHORIZED_PERMISSION");
}

#[actix_web::test]
async fn test_route_key_includes_method() {
    let app = app!(HttpAuthConfig::default());

    // [GET] /orders has no requirements
    let req = test::TestRequest::get()
        .uri("/orders")
        .insert_header(("Authorization", "Bearer tok-reader"))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, "user-tok-reader");
}

#[actix_web::test]
async fn test_graphql_mode_lets_anonymous_through() {
    let app = app!(HttpAuthConfig { graphql_mode: true });

    let req = test::TestRequest::get().uri("/orders").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "");

    // A presented token is still checked against the route
    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("Authorization", "Bearer tok-reader"))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().expect("denied");
    assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_introspection_error_is_forwarded() {
    let app = app!(HttpAuthConfig::default());

    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("Authorization", "Bearer forged"))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().expect("rejected");
    let resp = err.error_response();

    let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["meta"]["name"], "INVALID_TOKEN");
    assert_eq!(json["message"], "invalid token");
}

#[actix_web::test]
async fn test_headers_cannot_claim_trusted_user_type() {
    let app = app!(HttpAuthConfig::default());

    let req = test::TestRequest::post()
        .uri("/orders")
        .insert_header(("Authorization", "Bearer client-cred"))
        .insert_header(("UserType", "ADMIN"))
        .insert_header(("UserID", "root"))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().expect("denied");

    assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_graphql_mode_ignores_claimed_identity() {
    let app = app!(HttpAuthConfig { graphql_mode: true });

    let req = test::TestRequest::post()
        .uri("/claims")
        .insert_header(("UserType", "ADMIN"))
        .insert_header(("UserID", "root"))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, "|");
}
