use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::addresses::CreateAddressRequest, models::Order};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub payment_method: String,
    pub address: CreateAddressRequest,
}

/// Result of a checkout. `order` is the first line, kept for clients that
/// expect a single order; `orders` lists every line created.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResult {
    pub order: Order,
    pub orders: Vec<Order>,
}
