//! Meal catalog: remote fetch and snapshot lifecycle
//!
//! The catalog is fetched once per session as an immutable snapshot. The
//! loader owns an explicit `Loading → Ready | Failed` state which browsing and
//! the subscription configurator gate on. A failed fetch never propagates: the
//! loader records the failure, browsing sees an empty catalog, and `retry()`
//! starts a new fetch.

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{Meal, MealId};
use async_trait::async_trait;
use mealbox_common::api::ServiceEnvelope;
use mealbox_common::events::{EventBus, NotificationLevel, StorefrontEvent};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("mealbox-sf/", env!("CARGO_PKG_VERSION"));

/// Source of catalog records
#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn fetch_meals(&self) -> StorefrontResult<Vec<Meal>>;
}

/// Meal Catalog Service over HTTP (`GET {base}/meals`)
pub struct HttpCatalogClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> StorefrontResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| StorefrontError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CatalogService for HttpCatalogClient {
    async fn fetch_meals(&self) -> StorefrontResult<Vec<Meal>> {
        let url = format!("{}/meals", self.base_url);
        debug!(url = %url, "Fetching meal catalog");

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorefrontError::Network(format!(
                "catalog fetch failed ({}): {}",
                status.as_u16(),
                body
            )));
        }

        let envelope: ServiceEnvelope<Vec<Meal>> = response
            .json()
            .await
            .map_err(|e| StorefrontError::Network(format!("malformed catalog response: {}", e)))?;

        if !envelope.success {
            return Err(StorefrontError::Network(
                envelope.message_or("Failed to fetch meals"),
            ));
        }

        Ok(envelope.data.unwrap_or_default())
    }
}

/// Immutable catalog contents
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    meals: Vec<Meal>,
}

impl CatalogSnapshot {
    pub fn new(meals: Vec<Meal>) -> Self {
        Self { meals }
    }

    pub fn meals(&self) -> &[Meal] {
        &self.meals
    }

    pub fn find(&self, id: MealId) -> Option<&Meal> {
        self.meals.iter().find(|m| m.id == id)
    }

    pub fn len(&self) -> usize {
        self.meals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }
}

/// Catalog availability
#[derive(Debug, Clone)]
pub enum CatalogState {
    Loading,
    Ready(Arc<CatalogSnapshot>),
    Failed { message: String },
}

impl CatalogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogState::Loading => "loading",
            CatalogState::Ready(_) => "ready",
            CatalogState::Failed { .. } => "failed",
        }
    }

    pub fn meal_count(&self) -> usize {
        match self {
            CatalogState::Ready(snapshot) => snapshot.len(),
            _ => 0,
        }
    }
}

/// Serializable catalog status for the local API
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatusView {
    pub status: &'static str,
    pub meal_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&CatalogState> for CatalogStatusView {
    fn from(state: &CatalogState) -> Self {
        let message = match state {
            CatalogState::Failed { message } => Some(message.clone()),
            _ => None,
        };
        Self {
            status: state.as_str(),
            meal_count: state.meal_count(),
            message,
        }
    }
}

/// Loads the catalog snapshot and publishes its state
pub struct CatalogLoader {
    service: Arc<dyn CatalogService>,
    state: watch::Sender<CatalogState>,
    event_bus: EventBus,
}

impl CatalogLoader {
    /// Create a loader in the `Loading` state; nothing is fetched until `load()`
    pub fn new(service: Arc<dyn CatalogService>, event_bus: EventBus) -> Self {
        let (state, _) = watch::channel(CatalogState::Loading);
        Self {
            service,
            state,
            event_bus,
        }
    }

    /// Fetch the catalog and publish the outcome
    pub async fn load(&self) -> CatalogState {
        self.publish(CatalogState::Loading);

        let next = match self.service.fetch_meals().await {
            Ok(meals) => {
                info!("Catalog loaded: {} meals", meals.len());
                CatalogState::Ready(Arc::new(CatalogSnapshot::new(meals)))
            }
            Err(e) => {
                warn!("Catalog fetch failed, browsing degrades to empty: {}", e);
                self.event_bus.notify(
                    NotificationLevel::Error,
                    "Error",
                    "Failed to load meals. Please try again.",
                );
                CatalogState::Failed {
                    message: e.to_string(),
                }
            }
        };

        self.publish(next.clone());
        next
    }

    /// Start a new fetch after a failure (or to refresh)
    pub async fn retry(&self) -> CatalogState {
        info!("Retrying catalog fetch");
        self.load().await
    }

    pub fn state(&self) -> CatalogState {
        self.state.borrow().clone()
    }

    /// Current snapshot when `Ready`
    pub fn snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        match &*self.state.borrow() {
            CatalogState::Ready(snapshot) => Some(Arc::clone(snapshot)),
            _ => None,
        }
    }

    /// Current snapshot, or an empty one when not `Ready`
    pub fn snapshot_or_empty(&self) -> Arc<CatalogSnapshot> {
        self.snapshot().unwrap_or_default()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<CatalogState> {
        self.state.subscribe()
    }

    fn publish(&self, next: CatalogState) {
        self.event_bus.emit_lossy(StorefrontEvent::CatalogStatusChanged {
            status: next.as_str().to_string(),
            meal_count: next.meal_count(),
            timestamp: chrono::Utc::now(),
        });
        self.state.send_replace(next);
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{meal, StaticCatalog};
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_loader_starts_loading_then_ready() {
        let service = Arc::new(StaticCatalog::new(vec![meal(1, "Bowl"), meal(2, "Soup")]));
        let loader = CatalogLoader::new(service, EventBus::new(16));

        assert!(matches!(loader.state(), CatalogState::Loading));
        assert!(loader.snapshot().is_none());

        loader.load().await;

        let snapshot = loader.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.find(MealId::new(2).unwrap()).unwrap().name, "Soup");
        assert!(snapshot.find(MealId::new(3).unwrap()).is_none());
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_and_retry_recovers() {
        let service = Arc::new(StaticCatalog::new(vec![meal(1, "Bowl")]));
        service.fail.store(true, Ordering::SeqCst);

        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let loader = CatalogLoader::new(service.clone(), bus);

        let state = loader.load().await;
        assert!(matches!(state, CatalogState::Failed { .. }));
        assert!(loader.snapshot_or_empty().is_empty());

        // loading, error toast, failed
        let mut saw_error_toast = false;
        while let Ok(event) = rx.try_recv() {
            if let StorefrontEvent::Notification { level, .. } = event {
                saw_error_toast |= level == NotificationLevel::Error;
            }
        }
        assert!(saw_error_toast);

        service.fail.store(false, Ordering::SeqCst);
        let state = loader.retry().await;
        assert!(matches!(state, CatalogState::Ready(_)));
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_status_view() {
        let view = CatalogStatusView::from(&CatalogState::Failed {
            message: "offline".to_string(),
        });
        assert_eq!(view.status, "failed");
        assert_eq!(view.meal_count, 0);
        assert_eq!(view.message.as_deref(), Some("offline"));
    }
}
