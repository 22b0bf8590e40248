//! Server-Sent Events (SSE) for storefront events

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /api/events - SSE event stream
///
/// Streams cart, subscription, favorites and catalog changes plus user
/// notifications.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    mealbox_common::sse::create_event_sse_stream(&state.event_bus, "mealbox-sf")
}
