use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::payments::ProcessPaymentRequest,
    error::AppResult,
    middleware::{
        auth::AuthUser,
        json::{ValidJson, ValidPath},
    },
    models::Payment,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/order/{order_id}", get(get_payment_by_order))
        .route("/payments/order/{order_id}/process", post(process_payment))
}

#[utoipa::path(
    get,
    path = "/payments/order/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Payment attached to the order", body = ApiResponse<Payment>),
        (status = 404, description = "Order or payment not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn get_payment_by_order(
    State(state): State<AppState>,
    user: AuthUser,
    ValidPath(order_id): ValidPath<Uuid>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::get_payment_by_order(&state, &user, order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/payments/order/{order_id}/process",
    params(("order_id" = Uuid, Path, description = "Order ID")),
    request_body = ProcessPaymentRequest,
    responses(
        (status = 200, description = "Payment PAID and order CONFIRMED", body = ApiResponse<Payment>),
        (status = 400, description = "Payment already processed", body = crate::error::ErrorResponse),
        (status = 404, description = "Order or payment not found", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
pub async fn process_payment(
    State(state): State<AppState>,
    user: AuthUser,
    ValidPath(order_id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<ProcessPaymentRequest>,
) -> AppResult<Json<ApiResponse<Payment>>> {
    let resp = payment_service::process_payment(&state, &user, order_id, payload).await?;
    Ok(Json(resp))
}
