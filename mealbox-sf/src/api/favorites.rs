//! Favorites endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::parse_meal_id;
use crate::error::StorefrontResult;
use crate::favorites::{FavoriteItem, FavoritesSource, ToggleOutcome};
use crate::models::MealId;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub authenticated: bool,
    pub liked_meals: Vec<MealId>,
    pub favorites: Vec<FavoriteItem>,
}

#[derive(Debug, Serialize)]
pub struct ToggleFavoriteResponse {
    pub meal_id: MealId,
    pub outcome: ToggleOutcome,
    pub is_favorited: bool,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub source: FavoritesSource,
    pub liked_meals: Vec<MealId>,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub meal_id: MealId,
    pub is_favorite: bool,
}

/// GET /api/favorites
pub async fn list_favorites(State(state): State<AppState>) -> Json<FavoritesResponse> {
    Json(FavoritesResponse {
        authenticated: state.session.is_authenticated().await,
        liked_meals: state.favorites.liked_meals().await,
        favorites: state.favorites.favorites().await,
    })
}

/// POST /api/favorites/:meal_id/toggle
///
/// 401 without a session; on a failed service call the flip is rolled back
/// and the service error is returned.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(meal_id): Path<String>,
) -> StorefrontResult<Json<ToggleFavoriteResponse>> {
    let meal_id = parse_meal_id(&meal_id)?;
    let outcome = state.favorites.toggle_favorite(meal_id).await?;

    Ok(Json(ToggleFavoriteResponse {
        meal_id,
        outcome,
        is_favorited: state.favorites.is_favorited(meal_id).await,
    }))
}

/// POST /api/favorites/reload
pub async fn reload_favorites(State(state): State<AppState>) -> StorefrontResult<Json<ReloadResponse>> {
    let source = state.favorites.load_favorites().await?;
    Ok(Json(ReloadResponse {
        source,
        liked_meals: state.favorites.liked_meals().await,
    }))
}

/// GET /api/favorites/check/:meal_id
pub async fn check_favorite(
    State(state): State<AppState>,
    Path(meal_id): Path<String>,
) -> StorefrontResult<Json<CheckResponse>> {
    let meal_id = parse_meal_id(&meal_id)?;
    let is_favorite = state.favorites.check_favorite(meal_id).await?;
    Ok(Json(CheckResponse { meal_id, is_favorite }))
}
