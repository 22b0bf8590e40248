//! Favorites synchronizer
//!
//! Owns the liked-meal set of the current session. Toggles are optimistic:
//! the set flips immediately, the Favorites Service is called, and the flip is
//! either committed (cache mirror updated, list reloaded) or compensated
//! (exact revert, error notification).
//!
//! Each toggle takes a request token, recorded per meal id. A response whose
//! token is no longer the latest for its meal is discarded: the newer toggle
//! owns the outcome. Ending or starting a session invalidates every token.

pub mod client;

pub use client::{FavoriteItem, FavoritesService, HttpFavoritesClient};

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::MealId;
use crate::session::{Session, SessionState};
use mealbox_common::events::{EventBus, NotificationLevel, StorefrontEvent};
use mealbox_common::store::{keys, load_json, save_json, DurableStore};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Where the current liked set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoritesSource {
    Server,
    Cache,
    Empty,
}

/// Result of a toggle that was not rolled back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// A newer toggle on the same meal owns the outcome
    Superseded,
}

#[derive(Debug, Clone, Copy)]
struct PendingToggle {
    token: u64,
    liked: bool,
}

#[derive(Debug, Default)]
struct FavoritesInner {
    liked: BTreeSet<MealId>,
    favorites: Vec<FavoriteItem>,
    next_token: u64,
    in_flight: HashMap<MealId, PendingToggle>,
    /// Bumped on session start/end
    epoch: u64,
}

impl FavoritesInner {
    fn reapply_in_flight(&mut self) {
        for (id, pending) in &self.in_flight {
            if pending.liked {
                self.liked.insert(*id);
            } else {
                self.liked.remove(id);
            }
        }
    }

    /// Liked set with every unconfirmed flip undone
    fn confirmed_liked(&self) -> BTreeSet<MealId> {
        let mut liked = self.liked.clone();
        for (id, pending) in &self.in_flight {
            if pending.liked {
                liked.remove(id);
            } else {
                liked.insert(*id);
            }
        }
        liked
    }

    fn liked_ids(&self) -> Vec<u32> {
        self.liked.iter().map(|id| id.get()).collect()
    }
}

pub struct FavoritesSynchronizer {
    service: Arc<dyn FavoritesService>,
    store: Arc<dyn DurableStore>,
    session: Arc<SessionState>,
    event_bus: EventBus,
    inner: Mutex<FavoritesInner>,
}

impl FavoritesSynchronizer {
    pub fn new(
        service: Arc<dyn FavoritesService>,
        store: Arc<dyn DurableStore>,
        session: Arc<SessionState>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            service,
            store,
            session,
            event_bus,
            inner: Mutex::new(FavoritesInner::default()),
        }
    }

    /// Seed the liked set from the durable cache
    ///
    /// Used at startup, before any session exists. A missing or unreadable
    /// cache leaves the set empty.
    pub async fn restore_cached(&self) -> usize {
        let cached = self.read_cache().await.unwrap_or_default();
        let mut inner = self.inner.lock().await;
        inner.liked = cached;
        self.emit_changed(&inner);
        inner.liked.len()
    }

    /// Install a session and load its favorites
    pub async fn start_session(&self, session: Session) -> StorefrontResult<FavoritesSource> {
        info!(user_id = %session.user_id, "Favorites session started");
        self.session.login(session).await;
        {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.in_flight.clear();
            inner.favorites.clear();
        }
        self.load_favorites().await
    }

    /// Drop the session, the liked set and the cache mirror
    pub async fn end_session(&self) {
        if let Some(previous) = self.session.logout().await {
            info!(user_id = %previous.user_id, "Favorites session ended");
        }

        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        inner.liked.clear();
        inner.favorites.clear();
        inner.in_flight.clear();

        if let Err(e) = self.store.remove(keys::LIKED_MEALS).await {
            warn!("Failed to clear favorites cache: {}", e);
        }
        self.emit_changed(&inner);
    }

    /// Fetch the favorites list and replace the liked set
    ///
    /// Falls back to the durable cache when the service fails. Toggles still
    /// in flight keep their optimistic effect over either source.
    pub async fn load_favorites(&self) -> StorefrontResult<FavoritesSource> {
        let Some(session) = self.session.current().await else {
            let mut inner = self.inner.lock().await;
            inner.liked.clear();
            inner.favorites.clear();
            self.emit_changed(&inner);
            return Ok(FavoritesSource::Empty);
        };

        let epoch = self.inner.lock().await.epoch;
        let result = self.service.list(&session).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            debug!("Discarding favorites list from a previous session");
            return Ok(FavoritesSource::Empty);
        }

        match result {
            Ok(items) => {
                let server_ids: BTreeSet<MealId> = items.iter().map(|item| item.meal_id).collect();
                self.write_cache(&server_ids).await;

                inner.liked = server_ids;
                inner.favorites = items;
                inner.reapply_in_flight();
                debug!("Loaded {} favorites from server", inner.favorites.len());
                self.emit_changed(&inner);
                Ok(FavoritesSource::Server)
            }
            Err(e) => {
                warn!("Failed to load favorites, using cached data: {}", e);
                drop(inner);
                let cached = self.read_cache().await;

                let mut inner = self.inner.lock().await;
                if inner.epoch != epoch {
                    return Ok(FavoritesSource::Empty);
                }
                let source = match cached {
                    Some(ids) => {
                        inner.liked = ids;
                        FavoritesSource::Cache
                    }
                    None => FavoritesSource::Empty,
                };
                inner.reapply_in_flight();
                self.event_bus.notify(
                    NotificationLevel::Warning,
                    "Connection Issue",
                    "Using cached favorites. Please check your connection.",
                );
                self.emit_changed(&inner);
                Ok(source)
            }
        }
    }

    /// Optimistically like or unlike `meal_id`
    ///
    /// Returns the service error after rolling back when the call fails.
    pub async fn toggle_favorite(&self, meal_id: MealId) -> StorefrontResult<ToggleOutcome> {
        let Some(session) = self.session.current().await else {
            self.event_bus.notify(
                NotificationLevel::Warning,
                "Login Required",
                "Please log in to manage your favorites",
            );
            return Err(StorefrontError::AuthRequired);
        };

        let (token, now_liked) = {
            let mut inner = self.inner.lock().await;
            let now_liked = !inner.liked.remove(&meal_id);
            if now_liked {
                inner.liked.insert(meal_id);
            }
            inner.next_token += 1;
            let token = inner.next_token;
            inner.in_flight.insert(meal_id, PendingToggle { token, liked: now_liked });
            self.emit_changed(&inner);
            (token, now_liked)
        };

        let result = if now_liked {
            self.service.add(&session, meal_id).await
        } else {
            self.service.remove(&session, meal_id).await
        };

        let mut inner = self.inner.lock().await;
        let is_latest = inner.in_flight.get(&meal_id).map(|p| p.token) == Some(token);
        if !is_latest {
            debug!(meal_id = %meal_id, token, "Discarding superseded favorite response");
            return Ok(ToggleOutcome::Superseded);
        }
        inner.in_flight.remove(&meal_id);

        match result {
            Ok(()) => {
                let liked = inner.confirmed_liked();
                self.write_cache(&liked).await;
                let (title, message) = if now_liked {
                    ("Added to Favorites", "Meal added to your favorites")
                } else {
                    ("Removed from Favorites", "Meal removed from your favorites")
                };
                self.event_bus.notify(NotificationLevel::Success, title, message);
                drop(inner);

                // Reconcile server-derived fields
                self.load_favorites().await?;

                Ok(if now_liked {
                    ToggleOutcome::Added
                } else {
                    ToggleOutcome::Removed
                })
            }
            Err(e) => {
                if now_liked {
                    inner.liked.remove(&meal_id);
                } else {
                    inner.liked.insert(meal_id);
                }
                warn!(meal_id = %meal_id, "Favorite toggle failed, rolled back: {}", e);
                self.event_bus.notify(
                    NotificationLevel::Error,
                    "Error",
                    format!("Failed to update favorite: {}", e),
                );
                self.emit_changed(&inner);
                Err(e)
            }
        }
    }

    pub async fn is_favorited(&self, meal_id: MealId) -> bool {
        self.inner.lock().await.liked.contains(&meal_id)
    }

    /// Liked meal ids, ascending
    pub async fn liked_meals(&self) -> Vec<MealId> {
        self.inner.lock().await.liked.iter().copied().collect()
    }

    /// Last favorites list loaded from the server
    pub async fn favorites(&self) -> Vec<FavoriteItem> {
        self.inner.lock().await.favorites.clone()
    }

    /// Ask the service directly, bypassing the local set
    pub async fn check_favorite(&self, meal_id: MealId) -> StorefrontResult<bool> {
        let session = self.session.current().await.ok_or(StorefrontError::AuthRequired)?;
        self.service.check(&session, meal_id).await
    }

    async fn read_cache(&self) -> Option<BTreeSet<MealId>> {
        match load_json::<Vec<MealId>>(self.store.as_ref(), keys::LIKED_MEALS).await {
            Ok(ids) => ids.map(|ids| ids.into_iter().collect()),
            Err(e) => {
                warn!("Ignoring unreadable favorites cache: {}", e);
                None
            }
        }
    }

    async fn write_cache(&self, liked: &BTreeSet<MealId>) {
        let ids: Vec<MealId> = liked.iter().copied().collect();
        if let Err(e) = save_json(self.store.as_ref(), keys::LIKED_MEALS, &ids).await {
            warn!("Failed to update favorites cache: {}", e);
        }
    }

    fn emit_changed(&self, inner: &FavoritesInner) {
        self.event_bus.emit_lossy(StorefrontEvent::FavoritesChanged {
            liked_meals: inner.liked_ids(),
            timestamp: chrono::Utc::now(),
        });
    }
}
