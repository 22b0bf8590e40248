//! mealbox-sf library - Storefront core
//!
//! Cart, subscription configurator, pricing, meal filtering and favorites,
//! exposed to the browser UI through a local JSON + SSE API.

use axum::Router;
use mealbox_common::config::StorefrontSettings;
use mealbox_common::events::EventBus;
use mealbox_common::store::DurableStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod api;
pub mod cart;
pub mod catalog;
pub mod debounce;
pub mod error;
pub mod favorites;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod plans;
pub mod pricing;
pub mod session;
pub mod subscription;

pub use error::{StorefrontError, StorefrontResult};

use cart::CartStore;
use catalog::{CatalogLoader, CatalogService};
use favorites::{FavoritesService, FavoritesSynchronizer};
use filter::MealFilterEngine;
use session::SessionState;
use subscription::SubscriptionConfigurator;

/// Event bus capacity for storefront events
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub cart: Arc<CartStore>,
    pub favorites: Arc<FavoritesSynchronizer>,
    pub catalog: Arc<CatalogLoader>,
    pub session: Arc<SessionState>,
    /// Open subscription drafts by id
    pub configurators: Arc<Mutex<HashMap<Uuid, SubscriptionConfigurator>>>,
    pub browse: Arc<Mutex<MealFilterEngine>>,
    pub event_bus: EventBus,
    pub settings: Arc<StorefrontSettings>,
}

impl AppState {
    /// Wire up the storefront containers
    ///
    /// Loads the persisted cart; the catalog is left in `Loading` until
    /// `catalog.load()` runs.
    pub async fn new(
        store: Arc<dyn DurableStore>,
        catalog_service: Arc<dyn CatalogService>,
        favorites_service: Arc<dyn FavoritesService>,
        settings: StorefrontSettings,
        event_bus: EventBus,
    ) -> Self {
        let session = Arc::new(SessionState::new());
        let cart = Arc::new(CartStore::open(Arc::clone(&store), event_bus.clone()).await);
        let favorites = Arc::new(FavoritesSynchronizer::new(
            favorites_service,
            store,
            Arc::clone(&session),
            event_bus.clone(),
        ));
        let catalog = Arc::new(CatalogLoader::new(catalog_service, event_bus.clone()));
        let browse = MealFilterEngine::new(
            settings.page_size,
            Duration::from_millis(settings.search_debounce_ms),
        );

        Self {
            cart,
            favorites,
            catalog,
            session,
            configurators: Arc::new(Mutex::new(HashMap::new())),
            browse: Arc::new(Mutex::new(browse)),
            event_bus,
            settings: Arc::new(settings),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};

    let cart = Router::new()
        .route("/api/cart", get(api::cart::get_cart).delete(api::cart::clear_cart))
        .route("/api/cart/meals", post(api::cart::add_meal))
        .route("/api/cart/meals/:id", delete(api::cart::remove_meal))
        .route("/api/cart/meals/:id/increment", post(api::cart::increment_meal))
        .route("/api/cart/meals/:id/decrement", post(api::cart::decrement_meal))
        .route("/api/cart/subscription", delete(api::cart::remove_subscription));

    let subscriptions = Router::new()
        .route("/api/subscriptions/drafts", post(api::subscriptions::open_draft))
        .route(
            "/api/subscriptions/drafts/:id",
            get(api::subscriptions::get_draft).delete(api::subscriptions::cancel_draft),
        )
        .route(
            "/api/subscriptions/drafts/:id/weeks/:week/meals/:meal_id",
            post(api::subscriptions::toggle_meal),
        )
        .route("/api/subscriptions/drafts/:id/commit", post(api::subscriptions::commit_draft))
        .route("/api/subscriptions/drafts/:id/retry", post(api::subscriptions::retry_catalog));

    let favorites = Router::new()
        .route("/api/session", post(api::session::start_session).delete(api::session::end_session))
        .route("/api/favorites", get(api::favorites::list_favorites))
        .route("/api/favorites/reload", post(api::favorites::reload_favorites))
        .route("/api/favorites/check/:meal_id", get(api::favorites::check_favorite))
        .route("/api/favorites/:meal_id/toggle", post(api::favorites::toggle_favorite));

    let browsing = Router::new()
        .route("/api/catalog", get(api::catalog::get_catalog))
        .route("/api/catalog/reload", post(api::catalog::reload_catalog))
        .route("/api/browse", get(api::browse::get_browse).put(api::browse::update_browse))
        .route("/api/plans", get(api::plans::list_plans))
        .route("/api/events", get(api::sse::event_stream));

    Router::new()
        .merge(cart)
        .merge(subscriptions)
        .merge(favorites)
        .merge(browsing)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
