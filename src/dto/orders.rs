use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Address, Order, Payment, Product};

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub product: Option<Product>,
    pub address: Option<Address>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
