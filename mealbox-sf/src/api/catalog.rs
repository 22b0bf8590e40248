//! Catalog endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::catalog::CatalogStatusView;
use crate::models::Meal;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    #[serde(flatten)]
    pub status: CatalogStatusView,
    /// Empty unless the catalog is ready
    pub meals: Vec<Meal>,
}

/// GET /api/catalog
pub async fn get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let current = state.catalog.state();
    Json(CatalogResponse {
        status: CatalogStatusView::from(&current),
        meals: state.catalog.snapshot_or_empty().meals().to_vec(),
    })
}

/// POST /api/catalog/reload
///
/// Waits for the fetch to finish; failure is reported in the status, not as
/// an HTTP error.
pub async fn reload_catalog(State(state): State<AppState>) -> Json<CatalogStatusView> {
    let next = state.catalog.retry().await;
    Json(CatalogStatusView::from(&next))
}
