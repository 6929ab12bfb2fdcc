use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{LockType, OnConflict},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems, Model as CartItemModel},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::{Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, Resource},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, line_total, sum_totals},
    response::ApiResponse,
    state::AppState,
};

pub async fn find_cart<C: ConnectionTrait>(db: &C, user_id: &str) -> AppResult<Option<CartModel>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(cart)
}

/// Returns the caller's cart, creating it on first use.
///
/// Two concurrent first calls for the same user both end up with the same row:
/// the insert is skipped on the unique `user_id` and the row is read back.
pub async fn get_or_create_cart<C: ConnectionTrait>(db: &C, user_id: &str) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(db, user_id).await? {
        return Ok(cart);
    }

    Carts::insert(CartActive {
        id: Set(Uuid::now_v7()),
        user_id: Set(user_id.to_string()),
        created_at: Set(Utc::now().into()),
    })
    .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;

    find_cart(db, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("cart for {user_id} missing after insert")))
}

/// Cart lines in the order they were first added, each with its current product.
pub async fn load_items<C: ConnectionTrait>(
    db: &C,
    cart_id: Uuid,
) -> AppResult<Vec<(CartItemModel, Option<ProductModel>)>> {
    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart_id))
        .order_by_asc(CartItemCol::Id)
        .find_also_related(Products)
        .all(db)
        .await?;
    Ok(items)
}

pub async fn clear_items<C: ConnectionTrait>(db: &C, cart_id: Uuid) -> AppResult<u64> {
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, &user.user_id).await?;
    let items: Vec<CartItem> = load_items(&state.orm, cart.id)
        .await?
        .into_iter()
        .map(|(item, product)| CartItem::from_entity(item, product))
        .collect();
    let total = sum_totals(items.iter().map(|item| item.total_price))?;

    Ok(ApiResponse::success(
        "OK",
        Cart {
            id: cart.id,
            user_id: cart.user_id,
            items,
            total,
        },
        None,
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(payload.product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))?;

    let cart = get_or_create_cart(&txn, &user.user_id).await?;

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    let current = existing.as_ref().map_or(0, |item| item.quantity);
    let quantity = current
        .checked_add(payload.quantity)
        .ok_or_else(|| AppError::Validation("quantity is too large".to_string()))?;
    if quantity > product.stock {
        return Err(AppError::InsufficientStock {
            product: product.name,
        });
    }

    let item = match existing {
        Some(item) => {
            let unit_price = item.unit_price;
            let mut active: CartItemActive = item.into();
            active.quantity = Set(quantity);
            active.total_price = Set(line_total(unit_price, quantity)?);
            active.update(&txn).await?
        }
        None => {
            let total_price = line_total(product.price, quantity)?;
            CartItemActive {
                id: Set(Uuid::now_v7()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                unit_price: Set(product.price),
                quantity: Set(quantity),
                total_price: Set(total_price),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?
        }
    };

    txn.commit().await?;

    tracing::info!(cart_id = %cart.id, product_id = %product.id, quantity, "cart line saved");
    audit::record(
        &state.orm,
        &user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Item added to the cart successfully",
        CartItem::from_entity(item, Some(product)),
        None,
    ))
}

pub async fn update_item_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let item = CartItems::find_by_id(item_id)
        .inner_join(Carts)
        .filter(CartCol::UserId.eq(user.user_id.as_str()))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound(Resource::CartItem))?;

    let product = Products::find_by_id(item.product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))?;

    if payload.quantity > product.stock {
        return Err(AppError::InsufficientStock {
            product: product.name,
        });
    }

    let total_price = line_total(item.unit_price, payload.quantity)?;
    let mut active: CartItemActive = item.into();
    active.quantity = Set(payload.quantity);
    active.total_price = Set(total_price);
    let item = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.orm,
        &user.user_id,
        "cart_update",
        "cart_items",
        serde_json::json!({ "cart_item_id": item.id, "quantity": item.quantity }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart item updated",
        CartItem::from_entity(item, Some(product)),
        None,
    ))
}

/// Removing a line that is not in the caller's cart is a no-op.
pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<()>> {
    if let Some(cart) = find_cart(&state.orm, &user.user_id).await? {
        let result = CartItems::delete_many()
            .filter(CartItemCol::Id.eq(item_id))
            .filter(CartItemCol::CartId.eq(cart.id))
            .exec(&state.orm)
            .await?;

        if result.rows_affected > 0 {
            audit::record(
                &state.orm,
                &user.user_id,
                "cart_remove",
                "cart_items",
                serde_json::json!({ "cart_item_id": item_id }),
            )
            .await;
        }
    }

    Ok(ApiResponse::message("Item removed from cart successfully"))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<()>> {
    let cart = find_cart(&state.orm, &user.user_id)
        .await?
        .ok_or(AppError::CartNotFound)?;

    let removed = clear_items(&state.orm, cart.id).await?;
    tracing::info!(cart_id = %cart.id, removed, "cart cleared");

    Ok(ApiResponse::message("User cart cleared"))
}
