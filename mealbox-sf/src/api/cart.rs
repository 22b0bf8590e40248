//! Cart endpoints
//!
//! Every mutation answers with the full cart, so the UI never has to
//! reconcile partial updates.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use super::parse_meal_id;
use crate::cart::CartState;
use crate::error::StorefrontResult;
use crate::models::{CartItem, MealLineItem};
use crate::pricing::{format_currency, CheckoutSummary};
use crate::AppState;

/// Cart contents with totals
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub cart_count: u32,
    pub summary: CheckoutSummary,
    /// `summary.total` formatted for display
    pub formatted_total: String,
}

impl CartResponse {
    fn new(state: &CartState, tax_rate: f64) -> Self {
        let summary = crate::pricing::checkout_summary(state.items(), tax_rate);
        Self {
            items: state.items().to_vec(),
            cart_count: state.cart_count(),
            formatted_total: format_currency(summary.total),
            summary,
        }
    }
}

/// GET /api/cart
pub async fn get_cart(State(state): State<AppState>) -> Json<CartResponse> {
    let cart = state.cart.snapshot().await;
    Json(CartResponse::new(&cart, state.settings.tax_rate))
}

/// DELETE /api/cart
pub async fn clear_cart(State(state): State<AppState>) -> Json<CartResponse> {
    let cart = state.cart.clear().await;
    Json(CartResponse::new(&cart, state.settings.tax_rate))
}

/// POST /api/cart/meals
///
/// Body is a meal line (`id`, `name`, `price`, `image`); an existing line
/// for the same id is incremented instead.
pub async fn add_meal(
    State(state): State<AppState>,
    Json(meal): Json<MealLineItem>,
) -> Json<CartResponse> {
    let cart = state.cart.add_meal(meal).await;
    Json(CartResponse::new(&cart, state.settings.tax_rate))
}

/// DELETE /api/cart/meals/:id
pub async fn remove_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StorefrontResult<Json<CartResponse>> {
    let id = parse_meal_id(&id)?;
    let cart = state.cart.remove_meal(id).await;
    Ok(Json(CartResponse::new(&cart, state.settings.tax_rate)))
}

/// POST /api/cart/meals/:id/increment
pub async fn increment_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StorefrontResult<Json<CartResponse>> {
    let id = parse_meal_id(&id)?;
    let cart = state.cart.increment_quantity(id).await;
    Ok(Json(CartResponse::new(&cart, state.settings.tax_rate)))
}

/// POST /api/cart/meals/:id/decrement
pub async fn decrement_meal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StorefrontResult<Json<CartResponse>> {
    let id = parse_meal_id(&id)?;
    let cart = state.cart.decrement_quantity(id).await;
    Ok(Json(CartResponse::new(&cart, state.settings.tax_rate)))
}

/// DELETE /api/cart/subscription
pub async fn remove_subscription(State(state): State<AppState>) -> Json<CartResponse> {
    let cart = state.cart.remove_subscription().await;
    Json(CartResponse::new(&cart, state.settings.tax_rate))
}
