use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CheckoutResult, PlaceOrderRequest},
    error::AppResult,
    middleware::{auth::AuthUser, json::ValidJson},
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/checkout/order", post(place_order))
}

#[utoipa::path(
    post,
    path = "/checkout/order",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "One order and payment per cart line; the cart is emptied", body = ApiResponse<CheckoutResult>),
        (status = 400, description = "Cart missing or empty, insufficient stock, invalid address", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResult>>> {
    let resp = checkout_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}
