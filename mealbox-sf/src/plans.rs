//! Subscription plan catalog
//!
//! The fixed set of plans a customer can configure. Prices are per meal.

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::BillingFrequency;
use crate::pricing::{self, PricingQuote};
use serde::Serialize;

/// A subscription plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    pub name: &'static str,
    pub tagline: &'static str,
    pub meals_per_week: u32,
    pub price_per_meal: f64,
    pub popular: bool,
}

impl Plan {
    pub fn weekly_total(&self) -> f64 {
        pricing::weekly_total(self.meals_per_week, self.price_per_meal)
    }

    /// Amount billed per period under `billing`
    pub fn displayed_total(&self, billing: BillingFrequency) -> f64 {
        pricing::displayed_total(self.meals_per_week, self.price_per_meal, billing)
    }

    pub fn quote(&self, billing: BillingFrequency) -> PricingQuote {
        pricing::quote(self.meals_per_week, self.price_per_meal, billing)
    }
}

const PLANS: [Plan; 3] = [
    Plan {
        name: "Basic",
        tagline: "Perfect for individuals",
        meals_per_week: 3,
        price_per_meal: 12.0,
        popular: false,
    },
    Plan {
        name: "Premium",
        tagline: "Great for couples",
        meals_per_week: 4,
        price_per_meal: 15.0,
        popular: true,
    },
    Plan {
        name: "Signature",
        tagline: "Ideal for families",
        meals_per_week: 5,
        price_per_meal: 18.0,
        popular: false,
    },
];

/// All plans, cheapest first
pub fn plans() -> &'static [Plan] {
    &PLANS
}

/// Look up a plan by name (case-insensitive)
pub fn find_plan(name: &str) -> StorefrontResult<&'static Plan> {
    PLANS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| StorefrontError::NotFound(format!("plan {:?}", name)))
}
