use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::payments::ProcessPaymentRequest,
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
    },
    error::{AppError, AppResult, Resource},
    middleware::auth::AuthUser,
    models::{OrderStatus, Payment, PaymentStatus, normalize_payment_method},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn owned_order(user: &AuthUser, order_id: Uuid) -> Condition {
    Condition::all()
        .add(OrderCol::UserId.eq(user.user_id.as_str()))
        .add(OrderCol::Id.eq(order_id))
}

pub async fn get_payment_by_order(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let order = Orders::find()
        .filter(owned_order(user, order_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound(Resource::Order))?;

    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound(Resource::Payment))?;

    Ok(ApiResponse::success(
        "OK",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}

/// Mark the order's payment as paid and confirm the order, together.
pub async fn process_payment(
    state: &AppState,
    user: &AuthUser,
    order_id: Uuid,
    payload: ProcessPaymentRequest,
) -> AppResult<ApiResponse<Payment>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(owned_order(user, order_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound(Resource::Order))?;

    let payment = Payments::find_by_id(order.payment_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound(Resource::Payment))?;

    if payment.status == PaymentStatus::Paid.as_str() {
        return Err(AppError::Validation("Payment already processed".into()));
    }

    let now = Utc::now();
    let mut payment: PaymentActive = payment.into();
    payment.status = Set(PaymentStatus::Paid.as_str().to_string());
    if let Some(method) = payload
        .payment_method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
    {
        payment.method = Set(normalize_payment_method(method));
    }
    payment.updated_at = Set(now.into());
    let payment = payment.update(&txn).await?;

    let mut order: OrderActive = order.into();
    order.status = Set(OrderStatus::Confirmed.as_str().to_string());
    order.updated_at = Set(now.into());
    let order = order.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, payment_id = %payment.id, "payment processed");
    audit::record(
        &state.orm,
        &user.user_id,
        "payment_processed",
        "payments",
        serde_json::json!({ "order_id": order.id, "payment_id": payment.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment processed successfully",
        Payment::from(payment),
        Some(Meta::empty()),
    ))
}
