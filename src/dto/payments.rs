use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProcessPaymentRequest {
    #[serde(default)]
    pub payment_method: Option<String>,
}
