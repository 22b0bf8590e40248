//! Error types for mealbox-sf
//!
//! One taxonomy for the storefront core and the local API:
//! each variant maps to exactly one HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mealbox_common::api::ErrorResponse;
use thiserror::Error;

/// Storefront error type
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorefrontError {
    /// Malformed input such as a non-numeric meal id (400)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// State conflict, e.g. meal already favorited (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation requires a logged-in session (401)
    #[error("Login required")]
    AuthRequired,

    /// Remote service unreachable or failing (502)
    #[error("Network error: {0}")]
    Network(String),

    /// Durable store read/write failed (500)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Catalog snapshot not loaded yet, or its fetch failed (503)
    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// Subscription commit attempted before every week is complete (422)
    #[error("Incomplete configuration: {0}")]
    IncompleteConfiguration(String),
}

impl StorefrontError {
    /// Machine-readable code used in API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            StorefrontError::Validation(_) => "VALIDATION_ERROR",
            StorefrontError::Conflict(_) => "CONFLICT",
            StorefrontError::NotFound(_) => "NOT_FOUND",
            StorefrontError::AuthRequired => "AUTH_REQUIRED",
            StorefrontError::Network(_) => "NETWORK_ERROR",
            StorefrontError::Storage(_) => "STORAGE_ERROR",
            StorefrontError::CatalogUnavailable(_) => "CATALOG_UNAVAILABLE",
            StorefrontError::IncompleteConfiguration(_) => "INCOMPLETE_CONFIGURATION",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            StorefrontError::Validation(_) => StatusCode::BAD_REQUEST,
            StorefrontError::Conflict(_) => StatusCode::CONFLICT,
            StorefrontError::NotFound(_) => StatusCode::NOT_FOUND,
            StorefrontError::AuthRequired => StatusCode::UNAUTHORIZED,
            StorefrontError::Network(_) => StatusCode::BAD_GATEWAY,
            StorefrontError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StorefrontError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StorefrontError::IncompleteConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<mealbox_common::Error> for StorefrontError {
    fn from(err: mealbox_common::Error) -> Self {
        StorefrontError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for StorefrontError {
    fn from(err: reqwest::Error) -> Self {
        StorefrontError::Network(err.to_string())
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse::new(self.code(), self.to_string()));
        (status, body).into_response()
    }
}

/// Result type for storefront operations
pub type StorefrontResult<T> = Result<T, StorefrontError>;
