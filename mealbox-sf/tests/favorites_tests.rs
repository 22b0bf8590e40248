//! Favorites synchronization tests
//!
//! Drives `FavoritesSynchronizer` against an in-process favorites service:
//! optimistic toggles, rollback, out-of-order responses, cache fallback and
//! session teardown.

use async_trait::async_trait;
use mealbox_common::events::StorefrontEvent;
use mealbox_common::store::{keys, load_json, save_json, DurableStore};
use mealbox_common::{EventBus, MemoryStore, NotificationLevel};
use mealbox_sf::favorites::{FavoriteItem, FavoritesService, FavoritesSource, FavoritesSynchronizer, ToggleOutcome};
use mealbox_sf::models::MealId;
use mealbox_sf::session::{Session, SessionState};
use mealbox_sf::{StorefrontError, StorefrontResult};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, oneshot};

fn id(raw: u32) -> MealId {
    MealId::new(raw).unwrap()
}

/// Favorites service backed by an in-memory set
///
/// Mutations are applied when the request arrives; `hold_next_add` delays the
/// response of the next `add` until the paired sender fires. With
/// `reject_held_add` set, the held `add` is never applied and answers with an
/// error once released.
#[derive(Default)]
struct FakeFavorites {
    server: Mutex<BTreeSet<MealId>>,
    fail_writes: AtomicBool,
    fail_list: AtomicBool,
    hold_next_add: Mutex<Option<oneshot::Receiver<()>>>,
    reject_held_add: AtomicBool,
}

impl FakeFavorites {
    fn with(ids: &[u32]) -> Self {
        let fake = Self::default();
        fake.server.lock().unwrap().extend(ids.iter().map(|raw| id(*raw)));
        fake
    }

    fn server_ids(&self) -> Vec<MealId> {
        self.server.lock().unwrap().iter().copied().collect()
    }

    fn check_writable(&self) -> StorefrontResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorefrontError::Network("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl FavoritesService for FakeFavorites {
    async fn add(&self, _session: &Session, meal_id: MealId) -> StorefrontResult<()> {
        self.check_writable()?;
        let hold = self.hold_next_add.lock().unwrap().take();
        let rejected = hold.is_some() && self.reject_held_add.load(Ordering::SeqCst);
        if !rejected {
            self.server.lock().unwrap().insert(meal_id);
        }

        if let Some(release) = hold {
            let _ = release.await;
        }
        if rejected {
            return Err(StorefrontError::Network("request timed out".to_string()));
        }
        Ok(())
    }

    async fn remove(&self, _session: &Session, meal_id: MealId) -> StorefrontResult<()> {
        self.check_writable()?;
        self.server.lock().unwrap().remove(&meal_id);
        Ok(())
    }

    async fn list(&self, _session: &Session) -> StorefrontResult<Vec<FavoriteItem>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StorefrontError::Network("service unavailable".to_string()));
        }
        Ok(self
            .server_ids()
            .into_iter()
            .enumerate()
            .map(|(i, meal_id)| FavoriteItem {
                favorite_id: i as i64 + 1,
                meal_id,
                meal_name: format!("Meal {}", meal_id),
                description: String::new(),
                price: 10.0,
                category: None,
                image_url: None,
                favorited_at: None,
            })
            .collect())
    }

    async fn check(&self, _session: &Session, meal_id: MealId) -> StorefrontResult<bool> {
        Ok(self.server.lock().unwrap().contains(&meal_id))
    }
}

struct Harness {
    service: Arc<FakeFavorites>,
    store: Arc<MemoryStore>,
    sync: Arc<FavoritesSynchronizer>,
    events: broadcast::Receiver<StorefrontEvent>,
}

fn harness(service: FakeFavorites) -> Harness {
    let service = Arc::new(service);
    let store = Arc::new(MemoryStore::new());
    let bus = EventBus::new(256);
    let events = bus.subscribe();
    let sync = Arc::new(FavoritesSynchronizer::new(
        service.clone(),
        store.clone(),
        Arc::new(SessionState::new()),
        bus,
    ));
    Harness {
        service,
        store,
        sync,
        events,
    }
}

fn session() -> Session {
    Session::new("user-1", "token-abc")
}

/// Notifications received so far, as (level, title)
fn drain_notifications(rx: &mut broadcast::Receiver<StorefrontEvent>) -> Vec<(NotificationLevel, String)> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let StorefrontEvent::Notification { level, title, .. } = event {
            out.push((level, title));
        }
    }
    out
}

async fn cached_ids(store: &MemoryStore) -> Option<Vec<MealId>> {
    load_json(store, keys::LIKED_MEALS).await.unwrap()
}

// =============================================================================
// Session lifecycle
// =============================================================================

#[tokio::test]
async fn test_start_session_loads_server_favorites() {
    let mut h = harness(FakeFavorites::with(&[3, 9]));

    let source = h.sync.start_session(session()).await.unwrap();

    assert_eq!(source, FavoritesSource::Server);
    assert_eq!(h.sync.liked_meals().await, vec![id(3), id(9)]);
    assert_eq!(h.sync.favorites().await.len(), 2);
    assert_eq!(cached_ids(&h.store).await, Some(vec![id(3), id(9)]));
    assert!(drain_notifications(&mut h.events).is_empty());
}

#[tokio::test]
async fn test_list_failure_falls_back_to_cache() {
    let mut h = harness(FakeFavorites::with(&[1]));
    save_json(h.store.as_ref(), keys::LIKED_MEALS, &[id(4), id(5)]).await.unwrap();
    h.service.fail_list.store(true, Ordering::SeqCst);

    let source = h.sync.start_session(session()).await.unwrap();

    assert_eq!(source, FavoritesSource::Cache);
    assert_eq!(h.sync.liked_meals().await, vec![id(4), id(5)]);
    let notes = drain_notifications(&mut h.events);
    assert_eq!(notes, vec![(NotificationLevel::Warning, "Connection Issue".to_string())]);
}

#[tokio::test]
async fn test_list_failure_without_cache_is_empty() {
    let h = harness(FakeFavorites::with(&[1]));
    h.service.fail_list.store(true, Ordering::SeqCst);

    let source = h.sync.start_session(session()).await.unwrap();

    assert_eq!(source, FavoritesSource::Empty);
    assert!(h.sync.liked_meals().await.is_empty());
}

#[tokio::test]
async fn test_restore_cached_before_login() {
    let h = harness(FakeFavorites::default());
    save_json(h.store.as_ref(), keys::LIKED_MEALS, &[id(2)]).await.unwrap();

    assert_eq!(h.sync.restore_cached().await, 1);
    assert!(h.sync.is_favorited(id(2)).await);
}

#[tokio::test]
async fn test_end_session_clears_state_and_cache() {
    let h = harness(FakeFavorites::with(&[1, 2]));
    h.sync.start_session(session()).await.unwrap();
    assert!(cached_ids(&h.store).await.is_some());

    h.sync.end_session().await;

    assert!(h.sync.liked_meals().await.is_empty());
    assert!(h.sync.favorites().await.is_empty());
    assert_eq!(h.store.get(keys::LIKED_MEALS).await.unwrap(), None);
}

// =============================================================================
// Toggling
// =============================================================================

#[tokio::test]
async fn test_toggle_without_session_requires_login() {
    let mut h = harness(FakeFavorites::default());

    let err = h.sync.toggle_favorite(id(42)).await.unwrap_err();

    assert!(matches!(err, StorefrontError::AuthRequired));
    assert!(!h.sync.is_favorited(id(42)).await);
    assert!(h.service.server_ids().is_empty());
    let notes = drain_notifications(&mut h.events);
    assert_eq!(notes, vec![(NotificationLevel::Warning, "Login Required".to_string())]);
}

#[tokio::test]
async fn test_toggle_adds_then_removes() {
    let h = harness(FakeFavorites::default());
    h.sync.start_session(session()).await.unwrap();

    assert_eq!(h.sync.toggle_favorite(id(42)).await.unwrap(), ToggleOutcome::Added);
    assert!(h.sync.is_favorited(id(42)).await);
    assert_eq!(h.service.server_ids(), vec![id(42)]);
    assert_eq!(cached_ids(&h.store).await, Some(vec![id(42)]));

    assert_eq!(h.sync.toggle_favorite(id(42)).await.unwrap(), ToggleOutcome::Removed);
    assert!(!h.sync.is_favorited(id(42)).await);
    assert!(h.service.server_ids().is_empty());
}

#[tokio::test]
async fn test_failed_add_rolls_back_with_one_error() {
    let mut h = harness(FakeFavorites::default());
    h.sync.start_session(session()).await.unwrap();
    drain_notifications(&mut h.events);
    h.service.fail_writes.store(true, Ordering::SeqCst);

    let err = h.sync.toggle_favorite(id(42)).await.unwrap_err();

    assert!(matches!(err, StorefrontError::Network(_)));
    assert!(!h.sync.is_favorited(id(42)).await);
    let errors: Vec<_> = drain_notifications(&mut h.events)
        .into_iter()
        .filter(|(level, _)| *level == NotificationLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
}

#[tokio::test]
async fn test_failed_remove_restores_like() {
    let h = harness(FakeFavorites::with(&[42]));
    h.sync.start_session(session()).await.unwrap();
    h.service.fail_writes.store(true, Ordering::SeqCst);

    assert!(h.sync.toggle_favorite(id(42)).await.is_err());

    assert!(h.sync.is_favorited(id(42)).await);
    assert_eq!(cached_ids(&h.store).await, Some(vec![id(42)]));
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let h = harness(FakeFavorites::default());
    h.sync.start_session(session()).await.unwrap();

    let (release, hold) = oneshot::channel();
    *h.service.hold_next_add.lock().unwrap() = Some(hold);

    let sync = h.sync.clone();
    let first = tokio::spawn(async move { sync.toggle_favorite(id(5)).await });

    // Wait for the optimistic like of the first toggle
    while !h.sync.is_favorited(id(5)).await {
        tokio::task::yield_now().await;
    }

    let second = h.sync.toggle_favorite(id(5)).await.unwrap();
    assert_eq!(second, ToggleOutcome::Removed);

    release.send(()).unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first, ToggleOutcome::Superseded);
    assert!(!h.sync.is_favorited(id(5)).await);
    assert!(h.service.server_ids().is_empty());
}

#[tokio::test]
async fn test_cache_never_keeps_unconfirmed_like() {
    let h = harness(FakeFavorites::default());
    h.sync.start_session(session()).await.unwrap();

    let (release, hold) = oneshot::channel();
    *h.service.hold_next_add.lock().unwrap() = Some(hold);
    h.service.reject_held_add.store(true, Ordering::SeqCst);

    let sync = h.sync.clone();
    let pending = tokio::spawn(async move { sync.toggle_favorite(id(2)).await });

    // Wait until the held add has reached the service
    while h.service.hold_next_add.lock().unwrap().is_some() {
        tokio::task::yield_now().await;
    }
    assert!(h.sync.is_favorited(id(2)).await);

    h.service.fail_list.store(true, Ordering::SeqCst);
    assert_eq!(h.sync.toggle_favorite(id(1)).await.unwrap(), ToggleOutcome::Added);
    assert_eq!(cached_ids(&h.store).await, Some(vec![id(1)]));
    assert_eq!(h.sync.liked_meals().await, vec![id(1), id(2)]);

    release.send(()).unwrap();
    assert!(pending.await.unwrap().is_err());
    assert_eq!(h.sync.liked_meals().await, vec![id(1)]);

    // A later fallback to the cache must not resurrect the rejected like
    assert_eq!(h.sync.load_favorites().await.unwrap(), FavoritesSource::Cache);
    assert_eq!(h.sync.liked_meals().await, vec![id(1)]);
    assert_eq!(h.service.server_ids(), vec![id(1)]);
}

#[tokio::test]
async fn test_check_favorite_asks_service() {
    let h = harness(FakeFavorites::with(&[8]));
    assert!(matches!(
        h.sync.check_favorite(id(8)).await,
        Err(StorefrontError::AuthRequired)
    ));

    h.sync.start_session(session()).await.unwrap();
    assert!(h.sync.check_favorite(id(8)).await.unwrap());
    assert!(!h.sync.check_favorite(id(9)).await.unwrap());
}
