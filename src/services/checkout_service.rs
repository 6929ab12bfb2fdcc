use std::collections::{BTreeSet, HashMap};

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::checkout::{CheckoutResult, PlaceOrderRequest},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        orders::ActiveModel as OrderActive,
        payments::ActiveModel as PaymentActive,
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult, Resource},
    middleware::auth::AuthUser,
    models::{Order, OrderStatus, PaymentStatus, line_total, normalize_payment_method},
    response::{ApiResponse, Meta},
    services::{address_service, cart_service, user_service},
    state::AppState,
};

/// Lock every product in one pass, in id order, so concurrent checkouts
/// acquire row locks in the same sequence.
async fn lock_products<C: ConnectionTrait>(
    db: &C,
    product_ids: BTreeSet<Uuid>,
) -> AppResult<HashMap<Uuid, ProductModel>> {
    let expected = product_ids.len();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(db)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();
    if products.len() != expected {
        return Err(AppError::NotFound(Resource::Product));
    }
    Ok(products)
}

/// Turn the caller's cart into one order and one payment per line.
///
/// Everything runs in a single transaction: any failure, including losing a
/// stock race to a concurrent checkout, leaves no address, payment or order
/// behind and keeps the cart as it was.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<CheckoutResult>> {
    if payload.payment_method.trim().is_empty() {
        return Err(AppError::Validation("payment_method is required".into()));
    }
    payload.address.validate()?;

    let txn = state.orm.begin().await?;

    let cart = cart_service::find_cart(&txn, &user.user_id)
        .await?
        .ok_or(AppError::CartNotFound)?;

    let items = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::Id)
        .all(&txn)
        .await?;
    if items.is_empty() {
        return Err(AppError::CartEmpty);
    }

    let products = lock_products(&txn, items.iter().map(|item| item.product_id).collect()).await?;
    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let product = products
            .get(&item.product_id)
            .ok_or(AppError::NotFound(Resource::Product))?;
        if product.stock < item.quantity {
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
            });
        }
        lines.push((item, product, line_total(product.price, item.quantity)?));
    }

    user_service::ensure_user(&txn, &user.user_id, user.username.as_deref()).await?;
    let address = address_service::insert_address(&txn, &user.user_id, &payload.address).await?;
    let method = normalize_payment_method(&payload.payment_method);

    let mut orders = Vec::with_capacity(items.len());
    for (item, product, line_total) in lines {
        let now = Utc::now();

        let payment = PaymentActive {
            id: Set(Uuid::now_v7()),
            order_id: Set(None),
            user_id: Set(user.user_id.clone()),
            method: Set(method.clone()),
            amount: Set(line_total),
            status: Set(PaymentStatus::Unpaid.as_str().to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let order = OrderActive {
            id: Set(Uuid::now_v7()),
            user_id: Set(user.user_id.clone()),
            product_id: Set(product.id),
            payment_id: Set(payment.id),
            address_id: Set(Some(address.id)),
            product_price: Set(product.price),
            quantity: Set(item.quantity),
            total_price: Set(line_total),
            status: Set(OrderStatus::Pending.as_str().to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let mut payment: PaymentActive = payment.into();
        payment.order_id = Set(Some(order.id));
        payment.update(&txn).await?;

        let deducted = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .filter(ProdCol::Id.eq(product.id))
            .filter(ProdCol::Stock.gte(item.quantity))
            .exec(&txn)
            .await?;
        if deducted.rows_affected == 0 {
            return Err(AppError::InsufficientStock {
                product: product.name.clone(),
            });
        }

        orders.push(Order::from(order));
    }

    cart_service::clear_items(&txn, cart.id).await?;
    txn.commit().await?;

    let order_ids: Vec<Uuid> = orders.iter().map(|order| order.id).collect();
    tracing::info!(user_id = %user.user_id, lines = orders.len(), "order placed");
    audit::record(
        &state.orm,
        &user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_ids": order_ids, "address_id": address.id }),
    )
    .await;

    let Some(order) = orders.first().cloned() else {
        return Err(AppError::CartEmpty);
    };

    Ok(ApiResponse::success(
        "Order placed successfully",
        CheckoutResult { order, orders },
        Some(Meta::empty()),
    ))
}
