mod common;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use shophub_api::{
    dto::{cart::AddToCartRequest, checkout::PlaceOrderRequest},
    entity::{
        Addresses, AuditLogs, CartItems, Orders, Payments, Users, audit_logs,
        products::ActiveModel as ProductActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{cart_service, checkout_service},
    state::AppState,
};
use uuid::Uuid;

async fn add(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(())
}

fn order_request(method: &str) -> PlaceOrderRequest {
    PlaceOrderRequest {
        payment_method: method.to_string(),
        address: common::address(),
    }
}

async fn assert_no_ledger_rows(state: &AppState) -> anyhow::Result<()> {
    assert_eq!(Orders::find().count(&state.orm).await?, 0);
    assert_eq!(Payments::find().count(&state.orm).await?, 0);
    assert_eq!(Addresses::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn single_line_checkout_creates_pending_order_and_unpaid_payment() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let category = common::seed_category(&state, "kitchen").await?;
    let product = common::seed_product(&state, category.id, "Enamel Mug", 1_250, 5).await?;
    let alice = common::user("alice");
    add(&state, &alice, product.id, 2).await?;

    let resp = checkout_service::place_order(&state, &alice, order_request("cash on delivery")).await?;
    assert_eq!(resp.message, "Order placed successfully");
    let result = resp.data.expect("checkout result");

    assert_eq!(result.orders.len(), 1);
    let order = &result.order;
    assert_eq!(order.id, result.orders[0].id);
    assert_eq!(order.status, "Pending");
    assert_eq!(order.product_id, product.id);
    assert_eq!(order.quantity, 2);
    assert_eq!(order.product_price, 1_250);
    assert_eq!(order.total_price, 2_500);
    assert!(order.address_id.is_some());

    let payment = Payments::find_by_id(order.payment_id)
        .one(&state.orm)
        .await?
        .expect("payment row");
    assert_eq!(payment.order_id, Some(order.id));
    assert_eq!(payment.method, "CASH");
    assert_eq!(payment.status, "UNPAID");
    assert_eq!(payment.amount, 2_500);

    assert_eq!(common::stock_of(&state, product.id).await?, 3);
    assert_eq!(CartItems::find().count(&state.orm).await?, 0);

    let user = Users::find_by_id("alice".to_string())
        .one(&state.orm)
        .await?
        .expect("user row");
    assert_eq!(user.username.as_deref(), Some("alice-name"));

    let audit = AuditLogs::find()
        .filter(audit_logs::Column::Action.eq("checkout"))
        .one(&state.orm)
        .await?
        .expect("checkout audit entry");
    assert_eq!(audit.user_id.as_deref(), Some("alice"));
    Ok(())
}

#[tokio::test]
async fn checkout_creates_one_order_and_payment_per_line() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let category = common::seed_category(&state, "outdoors").await?;
    let backpack = common::seed_product(&state, category.id, "Canvas Backpack", 8_900, 10).await?;
    let lamp = common::seed_product(&state, category.id, "Trail Headlamp", 2_999, 4).await?;
    let bottle = common::seed_product(&state, category.id, "Steel Bottle", 1_500, 6).await?;
    let bob = common::user("bob");
    add(&state, &bob, backpack.id, 1).await?;
    add(&state, &bob, lamp.id, 4).await?;
    add(&state, &bob, bottle.id, 2).await?;

    let result = checkout_service::place_order(&state, &bob, order_request("Credit/Debit Card"))
        .await?
        .data
        .expect("checkout result");

    assert_eq!(result.orders.len(), 3);
    assert_eq!(result.order.product_id, backpack.id);
    let products: Vec<Uuid> = result.orders.iter().map(|o| o.product_id).collect();
    assert_eq!(products, vec![backpack.id, lamp.id, bottle.id]);

    let address_ids: Vec<_> = result.orders.iter().map(|o| o.address_id).collect();
    assert!(address_ids.iter().all(|id| *id == address_ids[0]));
    assert_eq!(Addresses::find().count(&state.orm).await?, 1);

    for order in &result.orders {
        let payment = Payments::find()
            .filter(shophub_api::entity::payments::Column::OrderId.eq(order.id))
            .one(&state.orm)
            .await?
            .expect("payment for order");
        assert_eq!(payment.id, order.payment_id);
        assert_eq!(payment.method, "CARD");
        assert_eq!(payment.amount, order.total_price);
    }
    assert_eq!(Payments::find().count(&state.orm).await?, 3);

    assert_eq!(common::stock_of(&state, backpack.id).await?, 9);
    assert_eq!(common::stock_of(&state, lamp.id).await?, 0);
    assert_eq!(common::stock_of(&state, bottle.id).await?, 4);
    assert_eq!(CartItems::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_at_checkout_writes_nothing() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let category = common::seed_category(&state, "kitchen").await?;
    let product = common::seed_product(&state, category.id, "Pour Over Kettle", 4_900, 5).await?;
    let carol = common::user("carol");
    add(&state, &carol, product.id, 2).await?;

    // stock drops after the item was carted
    let mut active: ProductActive = product.clone().into();
    active.stock = Set(1);
    active.update(&state.orm).await?;

    let err = checkout_service::place_order(&state, &carol, order_request("cash on delivery"))
        .await
        .expect_err("stock 1 < quantity 2");
    match err {
        AppError::InsufficientStock { product } => assert_eq!(product, "Pour Over Kettle"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_no_ledger_rows(&state).await?;
    assert_eq!(common::stock_of(&state, product.id).await?, 1);
    assert_eq!(CartItems::find().count(&state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn empty_or_missing_cart_is_rejected() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let dave = common::user("dave");

    let err = checkout_service::place_order(&state, &dave, order_request("cash on delivery"))
        .await
        .expect_err("no cart");
    assert!(matches!(err, AppError::CartNotFound));

    cart_service::get_or_create_cart(&state.orm, "dave").await?;
    let err = checkout_service::place_order(&state, &dave, order_request("cash on delivery"))
        .await
        .expect_err("empty cart");
    assert!(matches!(err, AppError::CartEmpty));

    assert_no_ledger_rows(&state).await?;
    assert_eq!(Users::find().count(&state.orm).await?, 0);
    Ok(())
}

#[tokio::test]
async fn invalid_request_is_rejected_before_touching_the_cart() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let category = common::seed_category(&state, "kitchen").await?;
    let product = common::seed_product(&state, category.id, "Enamel Mug", 1_250, 5).await?;
    let erin = common::user("erin");
    add(&state, &erin, product.id, 1).await?;

    let err = checkout_service::place_order(&state, &erin, order_request("  "))
        .await
        .expect_err("blank method");
    assert!(matches!(err, AppError::Validation(_)));

    let mut request = order_request("cash on delivery");
    request.address.postal_code = String::new();
    let err = checkout_service::place_order(&state, &erin, request)
        .await
        .expect_err("missing postal code");
    assert!(matches!(err, AppError::Validation(_)));

    assert_no_ledger_rows(&state).await?;
    assert_eq!(CartItems::find().count(&state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn losing_a_stock_race_rolls_back_every_line() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let category = common::seed_category(&state, "outdoors").await?;
    let backpack = common::seed_product(&state, category.id, "Canvas Backpack", 8_900, 10).await?;
    let lamp = common::seed_product(&state, category.id, "Trail Headlamp", 2_999, 3).await?;
    let frank = common::user("frank");
    add(&state, &frank, backpack.id, 2).await?;
    add(&state, &frank, lamp.id, 3).await?;

    // Another checkout drains the lamp between validation and deduction.
    state
        .orm
        .execute_unprepared(
            "CREATE TRIGGER drain_lamp AFTER INSERT ON orders \
             WHEN (SELECT name FROM products WHERE id = NEW.product_id) = 'Trail Headlamp' \
             BEGIN UPDATE products SET stock = 0 WHERE id = NEW.product_id; END",
        )
        .await?;

    let err = checkout_service::place_order(&state, &frank, order_request("cash on delivery"))
        .await
        .expect_err("lamp stock drained");
    match err {
        AppError::InsufficientStock { product } => assert_eq!(product, "Trail Headlamp"),
        other => panic!("unexpected error: {other:?}"),
    }

    assert_no_ledger_rows(&state).await?;
    assert_eq!(Users::find().count(&state.orm).await?, 0);
    assert_eq!(common::stock_of(&state, backpack.id).await?, 10);
    assert_eq!(common::stock_of(&state, lamp.id).await?, 3);
    assert_eq!(CartItems::find().count(&state.orm).await?, 2);
    Ok(())
}

#[tokio::test]
async fn repriced_line_that_overflows_writes_nothing() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let category = common::seed_category(&state, "vault").await?;
    let product = common::seed_product(&state, category.id, "Gold Bar", 1_000, 10).await?;
    let gina = common::user("gina");
    add(&state, &gina, product.id, 3).await?;

    let mut active: ProductActive = product.clone().into();
    active.price = Set(i64::MAX / 2);
    active.update(&state.orm).await?;

    let err = checkout_service::place_order(&state, &gina, order_request("cash on delivery"))
        .await
        .expect_err("line total overflows");
    assert!(matches!(err, AppError::Validation(_)));

    assert_no_ledger_rows(&state).await?;
    assert_eq!(common::stock_of(&state, product.id).await?, 10);
    assert_eq!(CartItems::find().count(&state.orm).await?, 1);
    Ok(())
}

#[tokio::test]
async fn lines_are_ordered_by_cart_position_not_product_id() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let category = common::seed_category(&state, "kitchen").await?;
    let first = common::seed_product(&state, category.id, "Enamel Mug", 1_250, 5).await?;
    let second = common::seed_product(&state, category.id, "Pour Over Kettle", 4_900, 5).await?;
    let hank = common::user("hank");
    // carted in reverse of product creation, so cart order differs from lock order
    add(&state, &hank, second.id, 1).await?;
    add(&state, &hank, first.id, 2).await?;

    let result = checkout_service::place_order(&state, &hank, order_request("cash on delivery"))
        .await?
        .data
        .expect("checkout result");
    let products: Vec<Uuid> = result.orders.iter().map(|o| o.product_id).collect();
    assert_eq!(products, vec![second.id, first.id]);
    assert_eq!(common::stock_of(&state, first.id).await?, 3);
    assert_eq!(common::stock_of(&state, second.id).await?, 4);
    Ok(())
}
