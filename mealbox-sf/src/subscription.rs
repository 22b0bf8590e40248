//! Subscription configurator
//!
//! Per-week meal selection for one plan. Every plan runs for exactly
//! [`WEEKS_PER_PLAN`] weeks and each week needs exactly `meals_per_week`
//! distinct meals. Selection is blocked until the catalog snapshot is ready.
//!
//! Selections are meal ids. They resolve to display names only at commit,
//! against the snapshot current at that moment; an id that no longer resolves
//! rejects the commit and leaves the draft as it was.

use crate::cart::CartStore;
use crate::catalog::{CatalogLoader, CatalogState};
use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{BillingFrequency, MealId, SubscriptionLineItem, Week, WEEKS_PER_PLAN};
use crate::plans::Plan;
use crate::pricing::PricingQuote;
use mealbox_common::events::{EventBus, NotificationLevel, StorefrontEvent};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of a selection toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOutcome {
    Selected,
    Deselected,
    /// Week full and the meal not selected; nothing changed
    AtCapacity,
    /// Catalog still loading or failed; nothing changed
    CatalogUnavailable,
    /// Draft already committed or cancelled
    Closed,
}

/// Configurator availability, derived from the catalog state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConfiguratorStatus {
    Loading,
    Failed { message: String },
    Ready,
}

/// Uncommitted per-week selections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionDraft {
    selections: [Vec<MealId>; WEEKS_PER_PLAN],
}

impl SubscriptionDraft {
    /// Selected meals of `week`, in selection order
    pub fn week(&self, week: Week) -> &[MealId] {
        &self.selections[week.index()]
    }

    fn week_mut(&mut self, week: Week) -> &mut Vec<MealId> {
        &mut self.selections[week.index()]
    }
}

/// Per-week summary for display
#[derive(Debug, Clone, Serialize)]
pub struct WeekView {
    pub week: Week,
    pub meal_ids: Vec<MealId>,
    pub remaining: u32,
    pub complete: bool,
}

/// Display snapshot of a configurator
#[derive(Debug, Clone, Serialize)]
pub struct ConfiguratorView {
    pub plan_name: &'static str,
    pub meals_per_week: u32,
    pub billing_frequency: BillingFrequency,
    pub status: ConfiguratorStatus,
    pub open: bool,
    pub weeks: Vec<WeekView>,
    pub complete: bool,
    pub quote: PricingQuote,
    pub total: f64,
}

pub struct SubscriptionConfigurator {
    plan: &'static Plan,
    billing: BillingFrequency,
    catalog: Arc<CatalogLoader>,
    event_bus: EventBus,
    draft: Option<SubscriptionDraft>,
}

impl SubscriptionConfigurator {
    /// Open a fresh draft for `plan`
    pub fn open(
        plan: &'static Plan,
        billing: BillingFrequency,
        catalog: Arc<CatalogLoader>,
        event_bus: EventBus,
    ) -> Self {
        info!(plan = plan.name, billing = %billing, "Subscription configurator opened");
        Self {
            plan,
            billing,
            catalog,
            event_bus,
            draft: Some(SubscriptionDraft::default()),
        }
    }

    pub fn plan(&self) -> &'static Plan {
        self.plan
    }

    pub fn billing_frequency(&self) -> BillingFrequency {
        self.billing
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn draft(&self) -> Option<&SubscriptionDraft> {
        self.draft.as_ref()
    }

    pub fn status(&self) -> ConfiguratorStatus {
        match self.catalog.state() {
            CatalogState::Loading => ConfiguratorStatus::Loading,
            CatalogState::Failed { message } => ConfiguratorStatus::Failed { message },
            CatalogState::Ready(_) => ConfiguratorStatus::Ready,
        }
    }

    /// Refetch the catalog after a failure
    pub async fn retry(&self) -> ConfiguratorStatus {
        self.catalog.retry().await;
        self.status()
    }

    /// Select or deselect `meal_id` for `week`
    ///
    /// Selecting into a full week is a no-op reported as `AtCapacity`.
    pub fn toggle_meal_for_week(&mut self, week: Week, meal_id: MealId) -> SelectionOutcome {
        if self.status() != ConfiguratorStatus::Ready {
            return SelectionOutcome::CatalogUnavailable;
        }
        let capacity = self.plan.meals_per_week as usize;
        let Some(draft) = self.draft.as_mut() else {
            return SelectionOutcome::Closed;
        };

        let selected = draft.week_mut(week);
        if let Some(pos) = selected.iter().position(|id| *id == meal_id) {
            selected.remove(pos);
            debug!(%week, meal_id = %meal_id, "Meal deselected");
            return SelectionOutcome::Deselected;
        }
        if selected.len() >= capacity {
            debug!(%week, meal_id = %meal_id, "Week at capacity, selection ignored");
            return SelectionOutcome::AtCapacity;
        }
        selected.push(meal_id);
        SelectionOutcome::Selected
    }

    pub fn week_selections(&self, week: Week) -> &[MealId] {
        self.draft.as_ref().map(|d| d.week(week)).unwrap_or(&[])
    }

    pub fn remaining_capacity(&self, week: Week) -> u32 {
        self.plan
            .meals_per_week
            .saturating_sub(self.week_selections(week).len() as u32)
    }

    pub fn is_week_complete(&self, week: Week) -> bool {
        self.week_selections(week).len() == self.plan.meals_per_week as usize
    }

    pub fn is_configuration_complete(&self) -> bool {
        self.draft.is_some() && Week::all().all(|week| self.is_week_complete(week))
    }

    pub fn quote(&self) -> PricingQuote {
        self.plan.quote(self.billing)
    }

    /// Put the completed configuration into the cart
    ///
    /// On any error the cart is untouched and the draft retained.
    pub async fn commit(&mut self, cart: &CartStore) -> StorefrontResult<SubscriptionLineItem> {
        let Some(draft) = self.draft.as_ref() else {
            return Err(StorefrontError::NotFound("open subscription draft".to_string()));
        };

        if let Some(week) = Week::all().find(|week| !self.is_week_complete(*week)) {
            return Err(StorefrontError::IncompleteConfiguration(format!(
                "{} has {} of {} meals",
                week,
                draft.week(week).len(),
                self.plan.meals_per_week
            )));
        }

        let snapshot = self.catalog.snapshot().ok_or_else(|| {
            StorefrontError::CatalogUnavailable("catalog not loaded".to_string())
        })?;

        let mut weekly_meal_selections: [Vec<String>; WEEKS_PER_PLAN] = Default::default();
        for week in Week::all() {
            for id in draft.week(week) {
                let meal = snapshot.find(*id).ok_or_else(|| {
                    warn!(meal_id = %id, "Commit rejected: meal no longer in catalog");
                    StorefrontError::NotFound(format!("meal {} is no longer available", id))
                })?;
                weekly_meal_selections[week.index()].push(meal.name.clone());
            }
        }

        let item = SubscriptionLineItem {
            plan_name: self.plan.name.to_string(),
            meals_per_week: self.plan.meals_per_week,
            weekly_meal_selections,
            total_cost: self.plan.displayed_total(self.billing),
            billing_frequency: self.billing,
        };

        cart.add_subscription(item.clone()).await;
        self.draft = None;

        info!(plan = self.plan.name, total = item.total_cost, "Subscription committed to cart");
        self.event_bus.emit_lossy(StorefrontEvent::SubscriptionCommitted {
            plan_name: item.plan_name.clone(),
            total_cost: item.total_cost,
            timestamp: chrono::Utc::now(),
        });
        self.event_bus.notify(
            NotificationLevel::Success,
            "Subscription Added",
            format!("{} plan added to your cart", self.plan.name),
        );

        Ok(item)
    }

    /// Discard the draft; the cart is not touched
    pub fn cancel(&mut self) {
        if self.draft.take().is_some() {
            debug!(plan = self.plan.name, "Subscription draft cancelled");
        }
    }

    pub fn view(&self) -> ConfiguratorView {
        let weeks = Week::all()
            .map(|week| WeekView {
                week,
                meal_ids: self.week_selections(week).to_vec(),
                remaining: self.remaining_capacity(week),
                complete: self.is_week_complete(week),
            })
            .collect();

        ConfiguratorView {
            plan_name: self.plan.name,
            meals_per_week: self.plan.meals_per_week,
            billing_frequency: self.billing,
            status: self.status(),
            open: self.is_open(),
            weeks,
            complete: self.is_configuration_complete(),
            quote: self.quote(),
            total: self.plan.displayed_total(self.billing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::{meal, StaticCatalog};
    use crate::plans::find_plan;
    use mealbox_common::MemoryStore;

    fn week(n: u8) -> Week {
        Week::new(n).unwrap()
    }

    fn id(raw: u32) -> MealId {
        MealId::new(raw).unwrap()
    }

    async fn ready_catalog() -> Arc<CatalogLoader> {
        let meals = (1..=6).map(|i| meal(i, &format!("Meal {}", i))).collect();
        let loader = Arc::new(CatalogLoader::new(
            Arc::new(StaticCatalog::new(meals)),
            EventBus::new(64),
        ));
        loader.load().await;
        loader
    }

    fn fill_all_weeks(configurator: &mut SubscriptionConfigurator, ids: &[u32]) {
        for w in Week::all() {
            for raw in ids {
                configurator.toggle_meal_for_week(w, id(*raw));
            }
        }
    }

    #[tokio::test]
    async fn test_selection_blocked_while_loading() {
        let loader = Arc::new(CatalogLoader::new(
            Arc::new(StaticCatalog::new(vec![meal(1, "Bowl")])),
            EventBus::new(16),
        ));
        let mut c = SubscriptionConfigurator::open(
            find_plan("Basic").unwrap(),
            BillingFrequency::Weekly,
            loader,
            EventBus::new(16),
        );

        assert_eq!(c.status(), ConfiguratorStatus::Loading);
        assert_eq!(c.toggle_meal_for_week(week(1), id(1)), SelectionOutcome::CatalogUnavailable);
        assert!(c.week_selections(week(1)).is_empty());
    }

    #[tokio::test]
    async fn test_retry_after_failed_load_enables_selection() {
        let service = Arc::new(StaticCatalog::new(vec![meal(1, "Bowl")]));
        service.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        let loader = Arc::new(CatalogLoader::new(service.clone(), EventBus::new(16)));
        loader.load().await;

        let mut c = SubscriptionConfigurator::open(
            find_plan("Basic").unwrap(),
            BillingFrequency::Weekly,
            loader,
            EventBus::new(16),
        );
        assert!(matches!(c.status(), ConfiguratorStatus::Failed { .. }));
        assert_eq!(c.toggle_meal_for_week(week(1), id(1)), SelectionOutcome::CatalogUnavailable);

        service.fail.store(false, std::sync::atomic::Ordering::SeqCst);
        assert_eq!(c.retry().await, ConfiguratorStatus::Ready);
        assert_eq!(c.toggle_meal_for_week(week(1), id(1)), SelectionOutcome::Selected);
    }

    #[tokio::test]
    async fn test_capacity_is_never_exceeded() {
        let mut c = SubscriptionConfigurator::open(
            find_plan("Basic").unwrap(),
            BillingFrequency::Weekly,
            ready_catalog().await,
            EventBus::new(16),
        );

        for raw in 1..=3 {
            assert_eq!(c.toggle_meal_for_week(week(1), id(raw)), SelectionOutcome::Selected);
        }
        assert!(c.is_week_complete(week(1)));
        assert_eq!(c.toggle_meal_for_week(week(1), id(4)), SelectionOutcome::AtCapacity);
        assert_eq!(c.week_selections(week(1)).len(), 3);

        assert_eq!(c.toggle_meal_for_week(week(1), id(2)), SelectionOutcome::Deselected);
        assert_eq!(c.remaining_capacity(week(1)), 1);
        assert_eq!(c.toggle_meal_for_week(week(1), id(4)), SelectionOutcome::Selected);
        assert_eq!(c.week_selections(week(1)), &[id(1), id(3), id(4)]);
    }

    #[tokio::test]
    async fn test_incomplete_commit_leaves_cart_and_draft() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()), EventBus::new(16)).await;
        let mut c = SubscriptionConfigurator::open(
            find_plan("Basic").unwrap(),
            BillingFrequency::Weekly,
            ready_catalog().await,
            EventBus::new(16),
        );
        c.toggle_meal_for_week(week(1), id(1));

        let err = c.commit(&cart).await.unwrap_err();
        assert!(matches!(err, StorefrontError::IncompleteConfiguration(_)));
        assert_eq!(cart.cart_count().await, 0);
        assert_eq!(c.week_selections(week(1)), &[id(1)]);
    }

    #[tokio::test]
    async fn test_commit_builds_line_item_and_closes_draft() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()), EventBus::new(16)).await;
        let mut c = SubscriptionConfigurator::open(
            find_plan("Basic").unwrap(),
            BillingFrequency::Monthly,
            ready_catalog().await,
            EventBus::new(16),
        );
        fill_all_weeks(&mut c, &[3, 1, 2]);
        assert!(c.is_configuration_complete());

        let item = c.commit(&cart).await.unwrap();
        assert_eq!(item.plan_name, "Basic");
        assert_eq!(item.weekly_meal_selections[0], vec!["Meal 3", "Meal 1", "Meal 2"]);
        assert_eq!(item.total_cost, 36.0 * 4.0 * 0.9);
        assert_eq!(cart.cart_count().await, 1);

        assert!(!c.is_open());
        assert_eq!(c.toggle_meal_for_week(week(1), id(4)), SelectionOutcome::Closed);
    }

    #[tokio::test]
    async fn test_unresolvable_meal_rejects_commit() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()), EventBus::new(16)).await;
        let mut c = SubscriptionConfigurator::open(
            find_plan("Basic").unwrap(),
            BillingFrequency::Weekly,
            ready_catalog().await,
            EventBus::new(16),
        );
        fill_all_weeks(&mut c, &[1, 2, 99]);

        let before = c.draft().cloned();
        let err = c.commit(&cart).await.unwrap_err();
        assert!(matches!(err, StorefrontError::NotFound(_)));
        assert_eq!(c.draft().cloned(), before);
        assert_eq!(cart.cart_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_discards_draft() {
        let cart = CartStore::open(Arc::new(MemoryStore::new()), EventBus::new(16)).await;
        let mut c = SubscriptionConfigurator::open(
            find_plan("Premium").unwrap(),
            BillingFrequency::Weekly,
            ready_catalog().await,
            EventBus::new(16),
        );
        fill_all_weeks(&mut c, &[1, 2, 3, 4]);
        c.cancel();

        assert!(!c.is_configuration_complete());
        assert!(c.commit(&cart).await.is_err());
        assert_eq!(cart.cart_count().await, 0);
    }
}
