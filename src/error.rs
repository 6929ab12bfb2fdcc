use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::identity::IdentityError;

/// Kinds of record a lookup can miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Product,
    CartItem,
    Order,
    Payment,
    Category,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Product => "product",
            Resource::CartItem => "cart item",
            Resource::Order => "order",
            Resource::Payment => "payment",
            Resource::Category => "category",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("cart not found")]
    CartNotFound,

    #[error("cart is empty")]
    CartEmpty,

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("identity provider error")]
    Identity(#[from] IdentityError),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// Body returned for every failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_)
            | AppError::CartNotFound
            | AppError::CartEmpty
            | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Identity(_) => StatusCode::BAD_GATEWAY,
            AppError::OrmError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::OrmError(err) => Some(err.to_string()),
            AppError::Identity(err) => Some(err.to_string()),
            AppError::Internal(err) => Some(format!("{err:#}")),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self.details();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, details = ?details, "request failed");
        }

        let error = match &self {
            AppError::Unauthenticated(_) => "unauthorized".to_string(),
            _ => status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
        };

        let body = ErrorResponse {
            error,
            error_description: self.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(
            AppError::Unauthenticated("missing token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::NotFound(Resource::Order).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::CartEmpty.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::InsufficientStock {
                product: "Ferris Mug".into()
            }
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::OrmError(sea_orm::DbErr::Custom("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let err = AppError::InsufficientStock {
            product: "Ferris Mug".into(),
        };
        assert_eq!(err.to_string(), "Insufficient stock for Ferris Mug");
    }
}
