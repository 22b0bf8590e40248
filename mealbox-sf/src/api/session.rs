//! Session hand-over from the external login flow

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::{StorefrontError, StorefrontResult};
use crate::favorites::FavoritesSource;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub favorites_source: FavoritesSource,
}

/// POST /api/session
///
/// Body: `{ "user_id", "token" }`. Loads the user's favorites.
pub async fn start_session(
    State(state): State<AppState>,
    Json(session): Json<Session>,
) -> StorefrontResult<Json<SessionResponse>> {
    if session.token.trim().is_empty() {
        return Err(StorefrontError::Validation("token must not be empty".to_string()));
    }

    let user_id = session.user_id.clone();
    let favorites_source = state.favorites.start_session(session).await?;

    Ok(Json(SessionResponse {
        user_id,
        favorites_source,
    }))
}

/// DELETE /api/session
pub async fn end_session(State(state): State<AppState>) -> StatusCode {
    state.favorites.end_session().await;
    StatusCode::NO_CONTENT
}
