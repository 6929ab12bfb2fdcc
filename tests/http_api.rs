mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn setup() -> (Router, shophub_api::state::AppState) {
    let state = common::setup_state().await.unwrap();
    let app = shophub_api::routes::build_app(state.clone(), &common::test_config());
    (app, state)
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, "GET", "/cart/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert!(body["error_description"].is_string());

    let (status, _) = send(&app, "GET", "/orders/", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_reject_plain_users() {
    let (app, state) = setup().await;
    let category = common::seed_category(&state, "kitchen").await.unwrap();
    let token = common::token("shopper", &["user"]);

    let (status, body) = send(
        &app,
        "POST",
        "/products/",
        Some(&token),
        Some(json!({
            "name": "Linen Apron",
            "slug": "linen-apron",
            "price": 3200,
            "stock": 5,
            "category_id": category.id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let admin = common::token("root", &["admin"]);
    let (status, body) = send(
        &app,
        "POST",
        "/products/",
        Some(&admin),
        Some(json!({
            "name": "Linen Apron",
            "slug": "linen-apron",
            "price": 3200,
            "stock": 5,
            "category_id": category.id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "linen-apron");
    assert_eq!(body["data"]["category"]["slug"], "kitchen");
}

#[tokio::test]
async fn malformed_input_uses_the_error_body() {
    let (app, _) = setup().await;
    let token = common::token("alice", &["user"]);

    let (status, body) = send(
        &app,
        "POST",
        "/cart/item",
        Some(&token),
        Some(json!({ "product_id": "not-a-uuid", "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error_description"]
            .as_str()
            .unwrap_or_default()
            .starts_with("Invalid request body")
    );

    let (status, _) = send(&app, "GET", "/orders/not-a-uuid", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/products/{}", uuid::Uuid::now_v7()),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_description"], "product not found");

    let (status, _) = send(&app, "GET", "/no/such/route", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn far_away_pages_are_empty_not_errors() {
    let (app, state) = setup().await;
    let category = common::seed_category(&state, "kitchen").await.unwrap();
    common::seed_product(&state, category.id, "Enamel Mug", 1250, 5)
        .await
        .unwrap();

    let uri = format!("/products/?page={}&per_page=100", u64::MAX);
    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"], json!([]));
    assert_eq!(body["meta"]["total"], 1);

    let token = common::token("alice", &["user"]);
    let uri = format!("/orders/?page={}", u64::MAX);
    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cart_to_paid_order_over_http() {
    let (app, state) = setup().await;
    let category = common::seed_category(&state, "kitchen").await.unwrap();
    let product = common::seed_product(&state, category.id, "Enamel Mug", 1250, 5)
        .await
        .unwrap();
    let token = common::token("alice", &["user"]);

    let (status, body) = send(
        &app,
        "POST",
        "/cart/item",
        Some(&token),
        Some(json!({ "product_id": product.id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item added to the cart successfully");

    let (status, body) = send(&app, "GET", "/cart/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2500);

    let (status, body) = send(
        &app,
        "POST",
        "/checkout/order",
        Some(&token),
        Some(json!({
            "payment_method": "Cash on Delivery",
            "address": {
                "line1": "12 Crab Street",
                "line2": "Flat 3",
                "city": "Lisbon",
                "postal_code": "1100-001",
                "country": "PT"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "Pending");
    assert_eq!(body["data"]["orders"].as_array().map(Vec::len), Some(1));
    let order_id = body["data"]["order"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/payments/order/{order_id}/process"),
        Some(&token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PAID");
    assert_eq!(body["data"]["method"], "CASH");

    let (status, body) = send(&app, "GET", &format!("/orders/{order_id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["order"]["status"], "CONFIRMED");

    let (status, body) = send(
        &app,
        "POST",
        "/checkout/order",
        Some(&token),
        Some(json!({
            "payment_method": "Cash on Delivery",
            "address": {
                "line1": "12 Crab Street",
                "line2": "Flat 3",
                "city": "Lisbon",
                "postal_code": "1100-001",
                "country": "PT"
            }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_description"], "cart is empty");

    let (status, body) = send(&app, "GET", "/orders/?status=CONFIRMED", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
}
