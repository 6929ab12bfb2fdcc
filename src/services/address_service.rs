use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::addresses::{AddressList, CreateAddressRequest},
    entity::addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses, Model as AddressModel},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    services::user_service,
    state::AppState,
};

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id.as_str()))
        .order_by_desc(AddressCol::CreatedAt)
        .order_by_desc(AddressCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();

    Ok(ApiResponse::success("OK", AddressList { items }, Some(Meta::empty())))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;

    user_service::ensure_user(&state.orm, &user.user_id, user.username.as_deref()).await?;
    let address = insert_address(&state.orm, &user.user_id, &payload).await?;

    audit::record(
        &state.orm,
        &user.user_id,
        "address_create",
        "addresses",
        serde_json::json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address created",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

/// Write a new address row. Callers validate the request first.
pub async fn insert_address<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    payload: &CreateAddressRequest,
) -> AppResult<AddressModel> {
    let address = AddressActive {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id.to_string()),
        line1: Set(payload.line1.trim().to_string()),
        line2: Set(payload.line2.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        postal_code: Set(payload.postal_code.trim().to_string()),
        country: Set(payload.country.trim().to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;

    Ok(address)
}
