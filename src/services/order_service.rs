use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderDetail, OrderList},
    entity::{
        addresses::Entity as Addresses,
        orders::{Column as OrderCol, Entity as Orders},
        payments::Entity as Payments,
        products::Entity as Products,
    },
    error::{AppError, AppResult, Resource},
    middleware::auth::AuthUser,
    models::{Address, Order, Payment, Product},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id.as_str()));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    // ids are time ordered, so they break ties between lines of one checkout
    finder = match sort_order {
        SortOrder::Asc => finder
            .order_by_asc(OrderCol::CreatedAt)
            .order_by_asc(OrderCol::Id),
        SortOrder::Desc => finder
            .order_by_desc(OrderCol::CreatedAt)
            .order_by_desc(OrderCol::Id),
    };

    let total = finder.clone().count(&state.orm).await?;

    let orders = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id.as_str()))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound(Resource::Order))?;

    let product = Products::find_by_id(order.product_id)
        .one(&state.orm)
        .await?
        .map(Product::from);
    let address = match order.address_id {
        Some(address_id) => Addresses::find_by_id(address_id)
            .one(&state.orm)
            .await?
            .map(Address::from),
        None => None,
    };
    let payment = Payments::find_by_id(order.payment_id)
        .one(&state.orm)
        .await?
        .map(Payment::from);

    Ok(ApiResponse::success(
        "OK",
        OrderDetail {
            order: Order::from(order),
            product,
            address,
            payment,
        },
        Some(Meta::empty()),
    ))
}
