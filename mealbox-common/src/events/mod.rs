//! Event types for the Mealbox event system
//!
//! Provides shared event definitions and the EventBus used by every
//! storefront component to announce state changes and user notifications.

mod notification_types;

pub use notification_types::NotificationLevel;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Storefront event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// All producers use this central enum for type safety and exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StorefrontEvent {
    /// Cart contents changed (any mutator, including no-op dispatches)
    CartChanged {
        /// Sum of meal quantities plus one for a subscription
        cart_count: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A subscription configuration was committed into the cart
    SubscriptionCommitted {
        plan_name: String,
        total_cost: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Liked-meal set changed (optimistic flip, rollback, or reload)
    FavoritesChanged {
        /// Current liked meal ids, ascending
        liked_meals: Vec<u32>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Catalog snapshot finished loading or failed
    CatalogStatusChanged {
        /// "loading", "ready" or "failed"
        status: String,
        meal_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transient user-visible notification (toast)
    Notification {
        id: Uuid,
        level: NotificationLevel,
        title: String,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl StorefrontEvent {
    /// Build a notification event with a fresh id and the current time
    pub fn notification(
        level: NotificationLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        StorefrontEvent::Notification {
            id: Uuid::new_v4(),
            level,
            title: title.into(),
            message: message.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    /// SSE event name for this event
    pub fn event_type(&self) -> &'static str {
        match self {
            StorefrontEvent::CartChanged { .. } => "CartChanged",
            StorefrontEvent::SubscriptionCommitted { .. } => "SubscriptionCommitted",
            StorefrontEvent::FavoritesChanged { .. } => "FavoritesChanged",
            StorefrontEvent::CatalogStatusChanged { .. } => "CatalogStatusChanged",
            StorefrontEvent::Notification { .. } => "Notification",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for application-wide events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use mealbox_common::events::{EventBus, NotificationLevel, StorefrontEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(StorefrontEvent::notification(
///     NotificationLevel::Info,
///     "Welcome",
///     "Catalog loaded",
/// ));
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StorefrontEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered before the oldest are
    /// dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: StorefrontEvent,
    ) -> Result<usize, broadcast::error::SendError<StorefrontEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: StorefrontEvent) {
        let _ = self.tx.send(event);
    }

    /// Emit a user-visible notification
    pub fn notify(
        &self,
        level: NotificationLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit_lossy(StorefrontEvent::notification(level, title, message));
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
