mod common;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::json;
use shophub_api::{
    identity::{IdentityError, KeycloakIntrospector, TokenIntrospector},
    state::AppState,
};
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

const INTROSPECT_PATH: &str = "/realms/shop/protocol/openid-connect/token/introspect";

fn introspector(server: &MockServer) -> KeycloakIntrospector {
    KeycloakIntrospector::new(
        &server.uri(),
        "shop",
        "shophub-api",
        SecretString::from("client-secret"),
        Duration::from_secs(5),
    )
    .expect("client")
}

#[tokio::test]
async fn posts_token_and_client_credentials_as_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INTROSPECT_PATH))
        .and(body_string_contains("token=good-token"))
        .and(body_string_contains("client_id=shophub-api"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "active": true,
            "sub": "kc-user-1",
            "preferred_username": "alice",
            "resource_access": {
                "shophub-api": { "roles": ["admin", "user"] },
                "account": { "roles": ["view-profile"] }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = introspector(&server).introspect("good-token").await.unwrap();
    assert!(result.active);
    assert_eq!(result.sub.as_deref(), Some("kc-user-1"));
    assert_eq!(
        result.resource_roles(),
        vec!["admin", "user", "view-profile"]
    );
}

#[tokio::test]
async fn inactive_tokens_are_reported_as_such() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INTROSPECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "active": false })))
        .mount(&server)
        .await;

    let result = introspector(&server).introspect("revoked").await.unwrap();
    assert!(!result.active);
    assert!(result.sub.is_none());
}

#[tokio::test]
async fn provider_errors_are_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INTROSPECT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized client"))
        .mount(&server)
        .await;

    let err = introspector(&server).introspect("any").await.unwrap_err();
    match err {
        IdentityError::Status { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "unauthorized client");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn provider_outage_maps_to_bad_gateway_and_garbage_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INTROSPECT_PATH))
        .and(body_string_contains("token=garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(INTROSPECT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let base = common::setup_state().await.unwrap();
    let state = AppState::new(base.orm.clone(), std::sync::Arc::new(introspector(&server)));
    let app = shophub_api::routes::build_app(state, &common::test_config());

    let request = |token: &str| {
        Request::builder()
            .uri("/cart/")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    let response = app.clone().oneshot(request("garbage")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.oneshot(request("other")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
