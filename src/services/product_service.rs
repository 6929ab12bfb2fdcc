use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func},
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{AdjustStockRequest, CreateProductRequest, ProductDetail, ProductList},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        product_images::{ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages},
        products::{ActiveModel, Column, Entity as Products},
    },
    error::{AppError, AppResult, Resource},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, MAX_PRICE, Product, ProductImage},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        condition = condition.add(Expr::expr(Func::lower(Expr::col((Products, Column::Name)))).like(pattern));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    if let Some(slug) = query.category.as_deref().filter(|s| !s.is_empty()) {
        finder = finder
            .inner_join(Categories)
            .filter(CategoryCol::Slug.eq(slug));
    }
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col).order_by_asc(Column::Id),
        SortOrder::Desc => finder.order_by_desc(sort_col).order_by_desc(Column::Id),
    };

    let total = finder.clone().count(&state.orm).await?;

    let items = finder
        .limit(limit)
        .offset(offset)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))?;

    let category = product
        .find_related(Categories)
        .one(&state.orm)
        .await?
        .map(Category::from);
    let images = ProductImages::find()
        .filter(ImageCol::ProductId.eq(product.id))
        .order_by_asc(ImageCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductImage::from)
        .collect();

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: Product::from(product),
            category,
            images,
        },
        None,
    ))
}

fn validate_product(payload: &CreateProductRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty() || payload.slug.trim().is_empty() {
        return Err(AppError::Validation("name and slug are required".into()));
    }
    if payload.price < 0 {
        return Err(AppError::Validation("price cannot be negative".into()));
    }
    if payload.price > MAX_PRICE {
        return Err(AppError::Validation(format!("price cannot exceed {MAX_PRICE}")));
    }
    if payload.stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".into()));
    }
    Ok(())
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductDetail>> {
    ensure_admin(user)?;
    validate_product(&payload)?;

    let txn = state.orm.begin().await?;

    let category = Categories::find_by_id(payload.category_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound(Resource::Category))?;

    let slug = payload.slug.trim().to_string();
    let taken = Products::find()
        .filter(Column::Slug.eq(slug.as_str()))
        .count(&txn)
        .await?;
    if taken > 0 {
        return Err(AppError::Validation(format!("slug {slug} is already taken")));
    }

    let product = ActiveModel {
        id: Set(Uuid::now_v7()),
        category_id: Set(category.id),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        price: Set(payload.price),
        stock: Set(payload.stock),
        image_url: Set(payload.image_url),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    let mut images = Vec::with_capacity(payload.images.len());
    for url in payload.images {
        let image = ImageActive {
            id: Set(Uuid::now_v7()),
            product_id: Set(product.id),
            url: Set(url),
        }
        .insert(&txn)
        .await?;
        images.push(ProductImage::from(image));
    }

    txn.commit().await?;

    audit::record(
        &state.orm,
        &user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        ProductDetail {
            product: Product::from(product),
            category: Some(Category::from(category)),
            images,
        },
        Some(Meta::empty()),
    ))
}

/// Add `delta` (possibly negative) to a product's stock, refusing to go below zero.
pub async fn adjust_stock(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AdjustStockRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let result = Products::update_many()
        .col_expr(Column::Stock, Expr::col(Column::Stock).add(payload.delta))
        .filter(Column::Id.eq(id))
        .filter(Column::Stock.gte(-i64::from(payload.delta)))
        .exec(&txn)
        .await?;

    let product = Products::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound(Resource::Product))?;
    if result.rows_affected == 0 {
        return Err(AppError::Validation("stock cannot be negative".into()));
    }

    txn.commit().await?;

    tracing::info!(product_id = %product.id, delta = payload.delta, stock = product.stock, "stock adjusted");
    audit::record(
        &state.orm,
        &user.user_id,
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": product.id, "delta": payload.delta }),
    )
    .await;

    Ok(ApiResponse::success(
        "Stock updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}
