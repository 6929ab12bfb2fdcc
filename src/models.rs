use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{addresses, cart_items, categories, orders, payments, product_images, products},
    error::AppError,
};

/// Highest unit price accepted for a product, in minor units.
pub const MAX_PRICE: i64 = 100_000_000_000;

/// Lifecycle of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "CONFIRMED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Paid => "PAID",
        }
    }
}

/// Map the free-form payment method sent by clients onto the stored vocabulary.
/// Unknown methods are kept as sent.
pub fn normalize_payment_method(method: &str) -> String {
    let trimmed = method.trim();
    if trimmed.eq_ignore_ascii_case("cash on delivery") {
        "CASH".to_string()
    } else if trimmed.eq_ignore_ascii_case("credit/debit card") {
        "CARD".to_string()
    } else {
        method.to_string()
    }
}

/// `unit_price * quantity`, rejecting amounts that do not fit in minor units.
pub fn line_total(unit_price: i64, quantity: i32) -> Result<i64, AppError> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| AppError::Validation("order amount is too large".to_string()))
}

/// Sum of line totals with the same overflow rule as [`line_total`].
pub fn sum_totals(totals: impl IntoIterator<Item = i64>) -> Result<i64, AppError> {
    totals.into_iter().try_fold(0i64, |acc, total| {
        acc.checked_add(total)
            .ok_or_else(|| AppError::Validation("order amount is too large".to_string()))
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub slug: String,
    /// Price in minor currency units.
    pub price: i64,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProductImage {
    pub id: Uuid,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub unit_price: i64,
    pub quantity: i32,
    pub total_price: i64,
    pub product: Option<Product>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: String,
    pub items: Vec<CartItem>,
    /// Sum of every line total.
    pub total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Address {
    pub id: Uuid,
    pub user_id: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub product_id: Uuid,
    pub payment_id: Uuid,
    pub address_id: Option<Uuid>,
    pub product_price: i64,
    pub quantity: i32,
    pub total_price: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub user_id: String,
    pub method: String,
    pub amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<categories::Model> for Category {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        Self {
            id: model.id,
            category_id: model.category_id,
            name: model.name,
            slug: model.slug,
            price: model.price,
            stock: model.stock,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<product_images::Model> for ProductImage {
    fn from(model: product_images::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
        }
    }
}

impl CartItem {
    pub fn from_entity(model: cart_items::Model, product: Option<products::Model>) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            unit_price: model.unit_price,
            quantity: model.quantity,
            total_price: model.total_price,
            product: product.map(Product::from),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            postal_code: model.postal_code,
            country: model.country,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            product_id: model.product_id,
            payment_id: model.payment_id,
            address_id: model.address_id,
            product_price: model.product_price,
            quantity: model.quantity,
            total_price: model.total_price,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<payments::Model> for Payment {
    fn from(model: payments::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            user_id: model.user_id,
            method: model.method,
            amount: model.amount,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
