//! Subscription configurator tests
//!
//! Selection limits per week and commit into the cart, with the catalog
//! served by an in-process service.

use async_trait::async_trait;
use mealbox_common::events::StorefrontEvent;
use mealbox_common::{EventBus, MemoryStore};
use mealbox_sf::cart::CartStore;
use mealbox_sf::catalog::{CatalogLoader, CatalogService};
use mealbox_sf::models::{BillingFrequency, CartItem, Meal, MealId, Week};
use mealbox_sf::plans::find_plan;
use mealbox_sf::subscription::{ConfiguratorStatus, SelectionOutcome, SubscriptionConfigurator};
use mealbox_sf::{StorefrontError, StorefrontResult};
use std::sync::Arc;

struct FixedCatalog(Vec<Meal>);

#[async_trait]
impl CatalogService for FixedCatalog {
    async fn fetch_meals(&self) -> StorefrontResult<Vec<Meal>> {
        Ok(self.0.clone())
    }
}

fn meal(raw: u32) -> Meal {
    serde_json::from_value(serde_json::json!({
        "id": raw,
        "name": format!("Meal {}", raw),
        "price": 11.0,
    }))
    .unwrap()
}

fn id(raw: u32) -> MealId {
    MealId::new(raw).unwrap()
}

fn week(n: u8) -> Week {
    Week::new(n).unwrap()
}

async fn loaded_catalog(count: u32) -> Arc<CatalogLoader> {
    let meals = (1..=count).map(meal).collect();
    let loader = Arc::new(CatalogLoader::new(Arc::new(FixedCatalog(meals)), EventBus::new(64)));
    loader.load().await;
    loader
}

async fn open(plan: &str, billing: BillingFrequency, bus: EventBus) -> SubscriptionConfigurator {
    SubscriptionConfigurator::open(find_plan(plan).unwrap(), billing, loaded_catalog(8).await, bus)
}

#[tokio::test]
async fn test_fourth_selection_rejected_for_three_meal_plan() {
    let mut c = open("Basic", BillingFrequency::Weekly, EventBus::new(16)).await;
    assert_eq!(c.plan().meals_per_week, 3);
    assert_eq!(c.status(), ConfiguratorStatus::Ready);

    for raw in [1, 2, 3] {
        assert_eq!(c.toggle_meal_for_week(week(1), id(raw)), SelectionOutcome::Selected);
    }
    assert!(c.is_week_complete(week(1)));

    assert_eq!(c.toggle_meal_for_week(week(1), id(4)), SelectionOutcome::AtCapacity);
    assert_eq!(c.week_selections(week(1)).len(), 3);
    assert!(!c.week_selections(week(1)).contains(&id(4)));
    assert!(!c.is_configuration_complete());
}

#[tokio::test]
async fn test_weeks_are_independent() {
    let mut c = open("Basic", BillingFrequency::Weekly, EventBus::new(16)).await;

    c.toggle_meal_for_week(week(2), id(5));
    c.toggle_meal_for_week(week(3), id(5));

    assert!(c.week_selections(week(1)).is_empty());
    assert_eq!(c.week_selections(week(2)), &[id(5)]);
    assert_eq!(c.week_selections(week(3)), &[id(5)]);
    assert_eq!(c.remaining_capacity(week(2)), 2);
    assert_eq!(c.remaining_capacity(week(4)), 3);
}

#[tokio::test]
async fn test_commit_only_when_every_week_is_full() {
    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let cart = CartStore::open(Arc::new(MemoryStore::new()), bus.clone()).await;
    let mut c = open("Premium", BillingFrequency::Monthly, bus).await;

    for w in Week::all() {
        for raw in [1, 2, 3, 4] {
            c.toggle_meal_for_week(w, id(raw));
        }
        if w.number() < 4 {
            let err = c.commit(&cart).await.unwrap_err();
            assert!(matches!(err, StorefrontError::IncompleteConfiguration(_)));
            assert_eq!(cart.cart_count().await, 0);
        }
    }
    assert!(c.is_configuration_complete());

    let quote = c.quote();
    let item = c.commit(&cart).await.unwrap();

    assert_eq!(item.plan_name, "Premium");
    assert_eq!(item.meals_per_week, 4);
    assert_eq!(item.billing_frequency, BillingFrequency::Monthly);
    assert_eq!(item.total_cost, quote.total);
    for selections in &item.weekly_meal_selections {
        assert_eq!(selections, &["Meal 1", "Meal 2", "Meal 3", "Meal 4"]);
    }

    let items = cart.items().await;
    assert_eq!(items.len(), 1);
    assert!(matches!(&items[0], CartItem::Subscription(s) if s.plan_name == "Premium"));
    assert!(!c.is_open());

    let mut committed = false;
    while let Ok(event) = rx.try_recv() {
        committed |= matches!(event, StorefrontEvent::SubscriptionCommitted { .. });
    }
    assert!(committed);
}

#[tokio::test]
async fn test_commit_replaces_previous_subscription() {
    let cart = CartStore::open(Arc::new(MemoryStore::new()), EventBus::new(16)).await;

    for plan in ["Basic", "Signature"] {
        let mut c = open(plan, BillingFrequency::Weekly, EventBus::new(16)).await;
        let capacity = c.plan().meals_per_week;
        for w in Week::all() {
            for raw in 1..=capacity {
                c.toggle_meal_for_week(w, id(raw));
            }
        }
        c.commit(&cart).await.unwrap();
    }

    let state = cart.snapshot().await;
    assert_eq!(state.cart_count(), 1);
    assert_eq!(state.subscription().map(|s| s.plan_name.as_str()), Some("Signature"));
}

#[tokio::test]
async fn test_quote_follows_billing_frequency() {
    let weekly = open("Signature", BillingFrequency::Weekly, EventBus::new(16)).await;
    let monthly = open("Signature", BillingFrequency::Monthly, EventBus::new(16)).await;

    assert_eq!(weekly.quote().total, 90.0);
    assert_eq!(monthly.quote().subtotal, 360.0);
    assert!((monthly.quote().total - 324.0).abs() < 1e-9);
}
