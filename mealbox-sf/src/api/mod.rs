//! HTTP API handlers for mealbox-sf

pub mod browse;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod health;
pub mod plans;
pub mod session;
pub mod sse;
pub mod subscriptions;

pub use health::health_routes;

use crate::error::StorefrontResult;
use crate::models::MealId;

/// Parse a meal id path segment
///
/// Taken as a string so malformed ids get the JSON error body.
pub(crate) fn parse_meal_id(raw: &str) -> StorefrontResult<MealId> {
    raw.parse()
}
