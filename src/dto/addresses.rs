use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, models::Address};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateAddressRequest {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl CreateAddressRequest {
    /// Every field is required; line fields hold up to 200 characters, the rest 100.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("line1", &self.line1, 200),
            ("line2", &self.line2, 200),
            ("city", &self.city, 100),
            ("postal_code", &self.postal_code, 100),
            ("country", &self.country, 100),
        ];
        for (name, value, max) in fields {
            let len = value.trim().chars().count();
            if len == 0 {
                return Err(AppError::Validation("All address fields are required".into()));
            }
            if len > max {
                return Err(AppError::Validation(format!(
                    "{name} must be at most {max} characters"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AddressList {
    #[schema(value_type = Vec<Address>)]
    pub items: Vec<Address>,
}
