//! Pricing engine
//!
//! Pure functions, no state. Amounts are unrounded `f64` currency values;
//! rounding to cents happens only in [`format_currency`].
//!
//! The total shown to the user for a plan is the amount billed per billing
//! period: the weekly total under weekly billing, the discounted four-week
//! aggregate under monthly billing. Plan listings, the configurator summary
//! and [`SubscriptionLineItem::total_cost`](crate::models::SubscriptionLineItem)
//! all use [`displayed_total`].

use crate::models::{BillingFrequency, CartItem, WEEKS_PER_PLAN};
use serde::Serialize;

/// Discount applied to the four-week aggregate under monthly billing
pub const MONTHLY_DISCOUNT_RATE: f64 = 0.1;

/// `1 - MONTHLY_DISCOUNT_RATE`, kept as a literal so products are exact
const MONTHLY_MULTIPLIER: f64 = 0.9;

/// Derived price breakdown for a plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricingQuote {
    /// Undiscounted amount for the billing period
    pub subtotal: f64,
    /// Fraction taken off the subtotal (0.0 or 0.1)
    pub discount_rate: f64,
    /// Amount billed per period
    pub total: f64,
}

/// Checkout hand-off totals for a whole cart
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckoutSummary {
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
}

/// `mealsPerWeek * pricePerMeal`
pub fn weekly_total(meals_per_week: u32, price_per_meal: f64) -> f64 {
    meals_per_week as f64 * price_per_meal
}

/// Four-week aggregate, discounted under monthly billing
pub fn monthly_aggregate(weekly_total: f64, billing: BillingFrequency) -> f64 {
    let multiplier = match billing {
        BillingFrequency::Monthly => MONTHLY_MULTIPLIER,
        BillingFrequency::Weekly => 1.0,
    };
    weekly_total * WEEKS_PER_PLAN as f64 * multiplier
}

/// Amount billed per period for a plan
pub fn displayed_total(meals_per_week: u32, price_per_meal: f64, billing: BillingFrequency) -> f64 {
    let weekly = weekly_total(meals_per_week, price_per_meal);
    match billing {
        BillingFrequency::Weekly => weekly,
        BillingFrequency::Monthly => monthly_aggregate(weekly, billing),
    }
}

pub fn quote(meals_per_week: u32, price_per_meal: f64, billing: BillingFrequency) -> PricingQuote {
    let weekly = weekly_total(meals_per_week, price_per_meal);
    match billing {
        BillingFrequency::Weekly => PricingQuote {
            subtotal: weekly,
            discount_rate: 0.0,
            total: weekly,
        },
        BillingFrequency::Monthly => PricingQuote {
            subtotal: weekly * WEEKS_PER_PLAN as f64,
            discount_rate: MONTHLY_DISCOUNT_RATE,
            total: monthly_aggregate(weekly, billing),
        },
    }
}

/// Subtotal, free shipping and estimated tax for the cart
pub fn checkout_summary(items: &[CartItem], tax_rate: f64) -> CheckoutSummary {
    let subtotal: f64 = items.iter().map(CartItem::line_total).sum();
    let shipping = 0.0;
    let tax = subtotal * tax_rate;

    CheckoutSummary {
        subtotal,
        shipping,
        tax,
        total: subtotal + shipping + tax,
    }
}

/// Parse a price from catalog or legacy cart text
///
/// Accepts `"12.5"`, `"$12.50"`, `" $1,250.00 "`. Unparseable → 0.0.
pub fn parse_price(text: &str) -> f64 {
    let cleaned: String = text
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();

    match cleaned.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Format an amount as dollars with two decimals
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MealId, MealLineItem, SubscriptionLineItem};

    #[test]
    fn test_weekly_total_exact() {
        assert_eq!(weekly_total(3, 12.0), 36.0);
        assert_eq!(weekly_total(4, 15.0), 60.0);
        assert_eq!(weekly_total(5, 18.0), 90.0);
    }

    #[test]
    fn test_monthly_aggregate_discount_only_when_monthly() {
        let weekly = weekly_total(4, 15.0);
        assert_eq!(monthly_aggregate(weekly, BillingFrequency::Monthly), weekly * 4.0 * 0.9);
        assert_eq!(monthly_aggregate(weekly, BillingFrequency::Weekly), weekly * 4.0);
    }

    #[test]
    fn test_displayed_total_per_billing_period() {
        assert_eq!(displayed_total(3, 12.0, BillingFrequency::Weekly), 36.0);
        assert_eq!(displayed_total(3, 12.0, BillingFrequency::Monthly), 36.0 * 4.0 * 0.9);
    }

    #[test]
    fn test_quote_monthly() {
        let q = quote(5, 18.0, BillingFrequency::Monthly);
        assert_eq!(q.subtotal, 360.0);
        assert_eq!(q.discount_rate, 0.1);
        assert_eq!(q.total, 90.0 * 4.0 * 0.9);
    }

    #[test]
    fn test_quote_weekly_has_no_discount() {
        let q = quote(3, 12.0, BillingFrequency::Weekly);
        assert_eq!(q.discount_rate, 0.0);
        assert_eq!(q.subtotal, q.total);
    }

    #[test]
    fn test_parse_price_variants() {
        assert_eq!(parse_price("$10.00"), 10.0);
        assert_eq!(parse_price("12.5"), 12.5);
        assert_eq!(parse_price(" $1,250.00 "), 1250.0);
        assert_eq!(parse_price("free"), 0.0);
        assert_eq!(parse_price(""), 0.0);
        assert_eq!(parse_price("NaN"), 0.0);
    }

    #[test]
    fn test_format_rounds_only_at_display() {
        assert_eq!(format_currency(32.4), "$32.40");
        assert_eq!(format_currency(10.0 / 3.0), "$3.33");
        assert_eq!(format_currency(-5.0), "-$5.00");
    }

    #[test]
    fn test_checkout_summary() {
        let items = vec![
            CartItem::Meal(MealLineItem {
                id: MealId::new(1).unwrap(),
                name: "Bowl".to_string(),
                unit_price: 10.0,
                quantity: 2,
                image_ref: String::new(),
            }),
            CartItem::Subscription(SubscriptionLineItem {
                plan_name: "Basic".to_string(),
                meals_per_week: 3,
                weekly_meal_selections: Default::default(),
                total_cost: 36.0,
                billing_frequency: BillingFrequency::Weekly,
            }),
        ];

        let summary = checkout_summary(&items, 0.08);
        assert_eq!(summary.subtotal, 56.0);
        assert_eq!(summary.shipping, 0.0);
        assert_eq!(summary.tax, 56.0 * 0.08);
        assert_eq!(summary.total, 56.0 + 56.0 * 0.08);
    }

    #[test]
    fn test_checkout_summary_empty_cart() {
        let summary = checkout_summary(&[], 0.08);
        assert_eq!(summary.total, 0.0);
    }
}
