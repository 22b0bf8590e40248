//! Subscription configurator endpoints
//!
//! Each open configurator is addressed by a draft id. Committing or
//! cancelling removes it; a failed commit keeps it open.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::parse_meal_id;
use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{BillingFrequency, SubscriptionLineItem, Week};
use crate::plans::find_plan;
use crate::subscription::{ConfiguratorStatus, ConfiguratorView, SelectionOutcome, SubscriptionConfigurator};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenDraftRequest {
    pub plan_name: String,
    #[serde(default)]
    pub billing_frequency: BillingFrequency,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft_id: Uuid,
    #[serde(flatten)]
    pub configurator: ConfiguratorView,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub outcome: SelectionOutcome,
    #[serde(flatten)]
    pub configurator: ConfiguratorView,
}

#[derive(Debug, Serialize)]
pub struct CommitResponse {
    pub item: SubscriptionLineItem,
    pub cart_count: u32,
}

fn parse_draft_id(raw: &str) -> StorefrontResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| StorefrontError::Validation(format!("malformed draft id: {:?}", raw)))
}

fn draft_not_found(id: Uuid) -> StorefrontError {
    StorefrontError::NotFound(format!("subscription draft {}", id))
}

/// POST /api/subscriptions/drafts
pub async fn open_draft(
    State(state): State<AppState>,
    Json(request): Json<OpenDraftRequest>,
) -> StorefrontResult<(StatusCode, Json<DraftResponse>)> {
    let plan = find_plan(&request.plan_name)?;
    let configurator = SubscriptionConfigurator::open(
        plan,
        request.billing_frequency,
        state.catalog.clone(),
        state.event_bus.clone(),
    );

    let draft_id = Uuid::new_v4();
    let view = configurator.view();
    state.configurators.lock().await.insert(draft_id, configurator);

    Ok((
        StatusCode::CREATED,
        Json(DraftResponse {
            draft_id,
            configurator: view,
        }),
    ))
}

/// GET /api/subscriptions/drafts/:id
pub async fn get_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StorefrontResult<Json<DraftResponse>> {
    let draft_id = parse_draft_id(&id)?;
    let configurators = state.configurators.lock().await;
    let configurator = configurators.get(&draft_id).ok_or_else(|| draft_not_found(draft_id))?;

    Ok(Json(DraftResponse {
        draft_id,
        configurator: configurator.view(),
    }))
}

/// DELETE /api/subscriptions/drafts/:id
pub async fn cancel_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StorefrontResult<StatusCode> {
    let draft_id = parse_draft_id(&id)?;
    let mut configurator = state
        .configurators
        .lock()
        .await
        .remove(&draft_id)
        .ok_or_else(|| draft_not_found(draft_id))?;

    configurator.cancel();
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/subscriptions/drafts/:id/weeks/:week/meals/:meal_id
pub async fn toggle_meal(
    State(state): State<AppState>,
    Path((id, week, meal_id)): Path<(String, String, String)>,
) -> StorefrontResult<Json<ToggleResponse>> {
    let draft_id = parse_draft_id(&id)?;
    let week: u8 = week
        .parse()
        .map_err(|_| StorefrontError::Validation(format!("malformed week: {:?}", week)))?;
    let week = Week::new(week)?;
    let meal_id = parse_meal_id(&meal_id)?;

    let mut configurators = state.configurators.lock().await;
    let configurator = configurators
        .get_mut(&draft_id)
        .ok_or_else(|| draft_not_found(draft_id))?;

    let outcome = configurator.toggle_meal_for_week(week, meal_id);
    Ok(Json(ToggleResponse {
        outcome,
        configurator: configurator.view(),
    }))
}

/// POST /api/subscriptions/drafts/:id/commit
pub async fn commit_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StorefrontResult<Json<CommitResponse>> {
    let draft_id = parse_draft_id(&id)?;
    let mut configurator = state
        .configurators
        .lock()
        .await
        .remove(&draft_id)
        .ok_or_else(|| draft_not_found(draft_id))?;

    // Other drafts stay usable while the cart write is in progress
    let item = match configurator.commit(&state.cart).await {
        Ok(item) => item,
        Err(e) => {
            state.configurators.lock().await.insert(draft_id, configurator);
            return Err(e);
        }
    };
    info!(draft_id = %draft_id, "Subscription draft committed");

    Ok(Json(CommitResponse {
        item,
        cart_count: state.cart.cart_count().await,
    }))
}

/// POST /api/subscriptions/drafts/:id/retry
pub async fn retry_catalog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> StorefrontResult<Json<ConfiguratorStatus>> {
    let draft_id = parse_draft_id(&id)?;
    if !state.configurators.lock().await.contains_key(&draft_id) {
        return Err(draft_not_found(draft_id));
    }

    // The configurator lock is not held across the fetch
    state.catalog.retry().await;

    let configurators = state.configurators.lock().await;
    let configurator = configurators.get(&draft_id).ok_or_else(|| draft_not_found(draft_id))?;
    Ok(Json(configurator.status()))
}
