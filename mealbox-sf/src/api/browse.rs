//! Meal browsing endpoints
//!
//! Search text and the quick filter are debounced: a `PUT` records them and
//! the view returned reflects them once the quiet period has passed.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tokio::time::Instant;

use crate::filter::FilterView;
use crate::AppState;

/// Partial browse update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct BrowseUpdate {
    pub search: Option<String>,
    pub quick_filter: Option<String>,
    pub detail_filters: Option<Vec<String>>,
    pub page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    #[serde(flatten)]
    pub view: FilterView,
    /// Latest typed search text (may not be applied yet)
    pub search: String,
    pub quick_filter: String,
    /// True while a debounced input waits for its quiet period
    pub pending: bool,
    /// "loading", "ready" or "failed"
    pub catalog: &'static str,
}

async fn respond(state: &AppState, now: Instant) -> BrowseResponse {
    let snapshot = state.catalog.snapshot_or_empty();
    let catalog = state.catalog.state().as_str();

    let mut engine = state.browse.lock().await;
    let view = engine.view(snapshot.meals(), now);

    BrowseResponse {
        view,
        search: engine.search_text().to_string(),
        quick_filter: engine.quick_filter().to_string(),
        pending: engine.is_pending(),
        catalog,
    }
}

/// GET /api/browse
pub async fn get_browse(State(state): State<AppState>) -> Json<BrowseResponse> {
    Json(respond(&state, Instant::now()).await)
}

/// PUT /api/browse
pub async fn update_browse(
    State(state): State<AppState>,
    Json(update): Json<BrowseUpdate>,
) -> Json<BrowseResponse> {
    let now = Instant::now();
    {
        let mut engine = state.browse.lock().await;
        if let Some(search) = update.search {
            engine.set_search(search, now);
        }
        if let Some(tag) = update.quick_filter {
            engine.set_quick_filter(tag, now);
        }
        if let Some(filters) = update.detail_filters {
            engine.set_detail_filters(filters.into_iter().collect::<BTreeSet<_>>());
        }
        if let Some(page) = update.page {
            engine.set_page(page);
        }
    }
    Json(respond(&state, now).await)
}
