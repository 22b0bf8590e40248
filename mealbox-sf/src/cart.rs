//! Cart store
//!
//! [`CartState`] is a plain value with a reducer ([`CartState::apply`]) that
//! upholds the cart invariants:
//! - at most one subscription line item
//! - meal line items unique by id
//! - every quantity ≥ 1 (a decrement to 0 removes the line)
//!
//! [`CartStore`] owns the live state. Each mutation applies one action and
//! writes the whole cart to the durable store under the same lock, so
//! mutations apply and persist in dispatch order. Write failures are logged
//! and otherwise ignored.

use crate::models::{CartItem, MealId, MealLineItem, SubscriptionLineItem};
use crate::pricing::{self, CheckoutSummary};
use mealbox_common::events::{EventBus, StorefrontEvent};
use mealbox_common::store::{keys, load_json, save_json, DurableStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// One cart mutation
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// Increment if present, else append with quantity 1
    AddMeal(MealLineItem),
    Increment(MealId),
    /// Removes the line when quantity is 1
    Decrement(MealId),
    RemoveMeal(MealId),
    /// Replaces any existing subscription
    AddSubscription(SubscriptionLineItem),
    RemoveSubscription,
    Clear,
}

/// Ordered cart line items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from untrusted items, restoring the invariants
    ///
    /// Duplicate meal ids are merged into the first occurrence, zero
    /// quantities dropped, and only the last subscription kept. Merged
    /// quantities saturate.
    pub fn normalized(items: Vec<CartItem>) -> Self {
        let last_subscription = items
            .iter()
            .rposition(|item| matches!(item, CartItem::Subscription(_)));

        let mut state = CartState::new();
        for (index, item) in items.into_iter().enumerate() {
            match item {
                CartItem::Meal(meal) => {
                    if meal.quantity == 0 {
                        continue;
                    }
                    match state.meal_mut(meal.id) {
                        Some(existing) => existing.quantity = existing.quantity.saturating_add(meal.quantity),
                        None => state.items.push(CartItem::Meal(meal)),
                    }
                }
                CartItem::Subscription(sub) => {
                    if Some(index) == last_subscription {
                        state.items.push(CartItem::Subscription(sub));
                    }
                }
            }
        }
        state
    }

    /// Apply one action
    pub fn apply(&mut self, action: CartAction) {
        match action {
            CartAction::AddMeal(meal) => match self.meal_mut(meal.id) {
                Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
                None => self.items.push(CartItem::Meal(MealLineItem { quantity: 1, ..meal })),
            },
            CartAction::Increment(id) => {
                if let Some(existing) = self.meal_mut(id) {
                    existing.quantity = existing.quantity.saturating_add(1);
                }
            }
            CartAction::Decrement(id) => {
                let remaining = self.meal_mut(id).map(|existing| {
                    existing.quantity = existing.quantity.saturating_sub(1);
                    existing.quantity
                });
                if remaining == Some(0) {
                    self.remove_meal(id);
                }
            }
            CartAction::RemoveMeal(id) => self.remove_meal(id),
            CartAction::AddSubscription(sub) => {
                self.items.retain(|item| !matches!(item, CartItem::Subscription(_)));
                self.items.push(CartItem::Subscription(sub));
            }
            CartAction::RemoveSubscription => {
                self.items.retain(|item| !matches!(item, CartItem::Subscription(_)));
            }
            CartAction::Clear => self.items.clear(),
        }
    }

    /// Sum of meal quantities, plus 1 for a subscription, saturating at `u32::MAX`
    pub fn cart_count(&self) -> u32 {
        self.items
            .iter()
            .map(CartItem::count)
            .fold(0u32, u32::saturating_add)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn subscription(&self) -> Option<&SubscriptionLineItem> {
        self.items.iter().find_map(|item| match item {
            CartItem::Subscription(sub) => Some(sub),
            CartItem::Meal(_) => None,
        })
    }

    pub fn quantity_of(&self, id: MealId) -> Option<u32> {
        self.items.iter().find_map(|item| match item {
            CartItem::Meal(meal) if meal.id == id => Some(meal.quantity),
            _ => None,
        })
    }

    fn meal_mut(&mut self, id: MealId) -> Option<&mut MealLineItem> {
        self.items.iter_mut().find_map(|item| match item {
            CartItem::Meal(meal) if meal.id == id => Some(meal),
            _ => None,
        })
    }

    fn remove_meal(&mut self, id: MealId) {
        self.items
            .retain(|item| !matches!(item, CartItem::Meal(meal) if meal.id == id));
    }
}

/// Live cart backed by the durable store
pub struct CartStore {
    state: Mutex<CartState>,
    store: Arc<dyn DurableStore>,
    event_bus: EventBus,
}

impl CartStore {
    /// Load the persisted cart
    ///
    /// A missing or unreadable cart yields an empty one; this never fails.
    pub async fn open(store: Arc<dyn DurableStore>, event_bus: EventBus) -> Self {
        let state = match load_json::<Vec<CartItem>>(store.as_ref(), keys::CART).await {
            Ok(Some(items)) => {
                let state = CartState::normalized(items);
                info!("Restored cart with {} line items", state.items().len());
                state
            }
            Ok(None) => CartState::new(),
            Err(e) => {
                warn!("Discarding unreadable cart: {}", e);
                CartState::new()
            }
        };

        Self {
            state: Mutex::new(state),
            store,
            event_bus,
        }
    }

    /// Apply, persist and announce one action; returns the new state
    pub async fn dispatch(&self, action: CartAction) -> CartState {
        let mut state = self.state.lock().await;
        debug!(?action, "Cart action");
        state.apply(action);

        if let Err(e) = save_json(self.store.as_ref(), keys::CART, state.items()).await {
            warn!("Failed to persist cart: {}", e);
        }

        self.event_bus.emit_lossy(StorefrontEvent::CartChanged {
            cart_count: state.cart_count(),
            timestamp: chrono::Utc::now(),
        });

        state.clone()
    }

    pub async fn add_meal(&self, meal: MealLineItem) -> CartState {
        self.dispatch(CartAction::AddMeal(meal)).await
    }

    pub async fn increment_quantity(&self, id: MealId) -> CartState {
        self.dispatch(CartAction::Increment(id)).await
    }

    pub async fn decrement_quantity(&self, id: MealId) -> CartState {
        self.dispatch(CartAction::Decrement(id)).await
    }

    pub async fn remove_meal(&self, id: MealId) -> CartState {
        self.dispatch(CartAction::RemoveMeal(id)).await
    }

    pub async fn add_subscription(&self, item: SubscriptionLineItem) -> CartState {
        self.dispatch(CartAction::AddSubscription(item)).await
    }

    pub async fn remove_subscription(&self) -> CartState {
        self.dispatch(CartAction::RemoveSubscription).await
    }

    pub async fn clear(&self) -> CartState {
        self.dispatch(CartAction::Clear).await
    }

    pub async fn cart_count(&self) -> u32 {
        self.state.lock().await.cart_count()
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.state.lock().await.items().to_vec()
    }

    pub async fn snapshot(&self) -> CartState {
        self.state.lock().await.clone()
    }

    pub async fn checkout_summary(&self, tax_rate: f64) -> CheckoutSummary {
        pricing::checkout_summary(self.state.lock().await.items(), tax_rate)
    }
}
