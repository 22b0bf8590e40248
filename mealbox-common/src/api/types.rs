//! Shared API request/response types

use serde::{Deserialize, Serialize};

/// Error codes carried in `error_code` by the remote storefront API
pub mod error_codes {
    pub const ALREADY_FAVORITED: &str = "ALREADY_FAVORITED";
    pub const MEAL_NOT_FOUND: &str = "MEAL_NOT_FOUND";
    pub const FAVORITE_NOT_FOUND: &str = "FAVORITE_NOT_FOUND";
}

/// Response envelope of the remote storefront API
///
/// `{ success, data?, message?, error_code? }`
///
/// # Examples
///
/// ```
/// use mealbox_common::api::ServiceEnvelope;
///
/// let json = r#"{"success": false, "message": "Meal already in favorites", "error_code": "ALREADY_FAVORITED"}"#;
/// let envelope: ServiceEnvelope<serde_json::Value> = serde_json::from_str(json).unwrap();
/// assert!(!envelope.success);
/// assert_eq!(envelope.error_code.as_deref(), Some("ALREADY_FAVORITED"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEnvelope<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl<T> ServiceEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error_code: None,
        }
    }

    pub fn failure(message: impl Into<String>, error_code: Option<&str>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            error_code: error_code.map(str::to_string),
        }
    }

    /// Message for logs and notifications, falling back to `fallback`
    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Error payload of the local API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind (e.g. "NOT_FOUND")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// `{ "error": { "code", "message" } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
