//! Favorites Service client
//!
//! `POST /favorites`, `DELETE /favorites/{id}`, `GET /favorites` and
//! `GET /favorites/check/{id}` on the remote storefront API, authenticated
//! with the session's bearer token.

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{deserialize_price, MealId};
use crate::session::Session;
use async_trait::async_trait;
use mealbox_common::api::{error_codes, ServiceEnvelope};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Server-side favorite record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteItem {
    pub favorite_id: i64,
    pub meal_id: MealId,
    pub meal_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub favorited_at: Option<String>,
}

/// Remote favorites operations
#[async_trait]
pub trait FavoritesService: Send + Sync {
    async fn add(&self, session: &Session, meal_id: MealId) -> StorefrontResult<()>;
    async fn remove(&self, session: &Session, meal_id: MealId) -> StorefrontResult<()>;
    async fn list(&self, session: &Session) -> StorefrontResult<Vec<FavoriteItem>>;
    async fn check(&self, session: &Session, meal_id: MealId) -> StorefrontResult<bool>;
}

/// Map a failed response to the error taxonomy
///
/// The HTTP status decides; `error_code` refines 2xx bodies that still report
/// `success: false`.
pub fn error_for_response(status: u16, error_code: Option<&str>, message: String) -> StorefrontError {
    match status {
        400 => StorefrontError::Validation(message),
        401 | 403 => StorefrontError::AuthRequired,
        404 => StorefrontError::NotFound(message),
        409 => StorefrontError::Conflict(message),
        200..=299 => match error_code {
            Some(error_codes::ALREADY_FAVORITED) => StorefrontError::Conflict(message),
            Some(error_codes::MEAL_NOT_FOUND) | Some(error_codes::FAVORITE_NOT_FOUND) => {
                StorefrontError::NotFound(message)
            }
            _ => StorefrontError::Network(message),
        },
        other => StorefrontError::Network(format!("{} (HTTP {})", message, other)),
    }
}

#[derive(Serialize)]
struct AddFavoriteRequest {
    meal_id: MealId,
}

#[derive(Deserialize)]
struct CheckFavoriteResponse {
    success: bool,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Favorites Service over HTTP
pub struct HttpFavoritesClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpFavoritesClient {
    pub fn new(base_url: &str, timeout: Duration) -> StorefrontResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("mealbox-sf/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| StorefrontError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/favorites{}", self.base_url, path)
    }

    /// Send and read the body; non-2xx becomes an error
    async fn execute(&self, request: reqwest::RequestBuilder, fallback: &str) -> StorefrontResult<String> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            let envelope: Option<ServiceEnvelope<serde_json::Value>> = serde_json::from_str(&body).ok();
            let message = envelope
                .as_ref()
                .map(|e| e.message_or(fallback))
                .unwrap_or_else(|| fallback.to_string());
            let code = envelope.as_ref().and_then(|e| e.error_code.as_deref());
            return Err(error_for_response(status, code, message));
        }

        Ok(body)
    }

    /// Decode an envelope, rejecting `success: false`
    fn decode<T: DeserializeOwned>(body: &str, fallback: &str) -> StorefrontResult<ServiceEnvelope<T>> {
        let envelope: ServiceEnvelope<T> = serde_json::from_str(body)
            .map_err(|e| StorefrontError::Network(format!("malformed favorites response: {}", e)))?;

        if !envelope.success {
            return Err(error_for_response(
                200,
                envelope.error_code.as_deref(),
                envelope.message_or(fallback),
            ));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl FavoritesService for HttpFavoritesClient {
    async fn add(&self, session: &Session, meal_id: MealId) -> StorefrontResult<()> {
        debug!(meal_id = %meal_id, "Adding favorite");
        let request = self
            .http_client
            .post(self.url(""))
            .bearer_auth(&session.token)
            .json(&AddFavoriteRequest { meal_id });

        let body = self.execute(request, "Failed to add favorite").await?;
        Self::decode::<serde_json::Value>(&body, "Failed to add favorite")?;
        Ok(())
    }

    async fn remove(&self, session: &Session, meal_id: MealId) -> StorefrontResult<()> {
        debug!(meal_id = %meal_id, "Removing favorite");
        let request = self
            .http_client
            .delete(self.url(&format!("/{}", meal_id)))
            .bearer_auth(&session.token);

        let body = self.execute(request, "Failed to remove favorite").await?;
        Self::decode::<serde_json::Value>(&body, "Failed to remove favorite")?;
        Ok(())
    }

    async fn list(&self, session: &Session) -> StorefrontResult<Vec<FavoriteItem>> {
        let request = self.http_client.get(self.url("")).bearer_auth(&session.token);

        let body = self.execute(request, "Failed to fetch favorites").await?;
        let envelope = Self::decode::<Vec<FavoriteItem>>(&body, "Failed to fetch favorites")?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn check(&self, session: &Session, meal_id: MealId) -> StorefrontResult<bool> {
        let request = self
            .http_client
            .get(self.url(&format!("/check/{}", meal_id)))
            .bearer_auth(&session.token);

        let body = self.execute(request, "Failed to check favorite status").await?;
        let response: CheckFavoriteResponse = serde_json::from_str(&body)
            .map_err(|e| StorefrontError::Network(format!("malformed favorites response: {}", e)))?;

        if !response.success {
            return Err(StorefrontError::Network(
                response
                    .message
                    .unwrap_or_else(|| "Failed to check favorite status".to_string()),
            ));
        }

        Ok(response.is_favorite)
    }
}
