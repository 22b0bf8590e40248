//! Storefront domain model
//!
//! Catalog records, cart line items and the identifiers shared by every
//! component.

use crate::error::{StorefrontError, StorefrontResult};
use crate::pricing::parse_price;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of weeks in every subscription configuration
pub const WEEKS_PER_PLAN: usize = 4;

/// Meal identifier (positive integer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct MealId(u32);

impl MealId {
    pub fn new(raw: u32) -> StorefrontResult<Self> {
        if raw == 0 {
            return Err(StorefrontError::Validation("meal id must be positive".to_string()));
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for MealId {
    type Error = StorefrontError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        MealId::new(raw)
    }
}

impl From<MealId> for u32 {
    fn from(id: MealId) -> u32 {
        id.0
    }
}

impl FromStr for MealId {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u32 = s
            .trim()
            .parse()
            .map_err(|_| StorefrontError::Validation(format!("malformed meal id: {:?}", s)))?;
        MealId::new(raw)
    }
}

impl fmt::Display for MealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accepts `12.5`, `"12.50"` and `"$12.50"`
pub(crate) fn deserialize_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PriceRepr {
        Number(f64),
        Text(String),
    }

    Ok(match PriceRepr::deserialize(deserializer)? {
        PriceRepr::Number(n) => n,
        PriceRepr::Text(s) => parse_price(&s),
    })
}

/// Catalog record as served by the Meal Catalog Service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(alias = "meal_id")]
    pub id: MealId,
    #[serde(alias = "meal")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "image_url")]
    pub image_ref: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub prep_time: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "isNew")]
    pub is_new: bool,
}

impl Meal {
    /// Whether `tag` is one of the meal's categories
    ///
    /// `category` may hold a comma-separated list; comparison is
    /// case-insensitive.
    pub fn in_category(&self, tag: &str) -> bool {
        self.category
            .as_deref()
            .map(|c| c.split(',').any(|part| part.trim().eq_ignore_ascii_case(tag)))
            .unwrap_or(false)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Cart line for one unit of this meal
    pub fn to_line_item(&self) -> MealLineItem {
        MealLineItem {
            id: self.id,
            name: self.name.clone(),
            unit_price: self.price,
            quantity: 1,
            image_ref: self.image_ref.clone(),
        }
    }
}

/// How a subscription is billed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingFrequency {
    #[default]
    Weekly,
    Monthly,
}

impl BillingFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingFrequency::Weekly => "weekly",
            BillingFrequency::Monthly => "monthly",
        }
    }
}

impl FromStr for BillingFrequency {
    type Err = StorefrontError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(BillingFrequency::Weekly),
            "monthly" => Ok(BillingFrequency::Monthly),
            other => Err(StorefrontError::Validation(format!(
                "unknown billing frequency: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for BillingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Week number within a subscription (1-based, 1..=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "u8")]
pub struct Week(u8);

impl Week {
    pub fn new(number: u8) -> StorefrontResult<Self> {
        if number == 0 || number as usize > WEEKS_PER_PLAN {
            return Err(StorefrontError::Validation(format!(
                "week must be between 1 and {}, got {}",
                WEEKS_PER_PLAN, number
            )));
        }
        Ok(Self(number))
    }

    /// Every week of a plan, in order
    pub fn all() -> impl Iterator<Item = Week> {
        (1..=WEEKS_PER_PLAN as u8).map(Week)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based index into per-week arrays
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl From<Week> for u8 {
    fn from(week: Week) -> u8 {
        week.0
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Week {}", self.0)
    }
}

/// Quantity of one meal in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLineItem {
    pub id: MealId,
    pub name: String,
    #[serde(deserialize_with = "deserialize_price", alias = "price")]
    pub unit_price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, alias = "image")]
    pub image_ref: String,
}

fn default_quantity() -> u32 {
    1
}

impl MealLineItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// A committed multi-week subscription
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLineItem {
    pub plan_name: String,
    pub meals_per_week: u32,
    /// Meal display names per week, in selection order
    pub weekly_meal_selections: [Vec<String>; WEEKS_PER_PLAN],
    pub total_cost: f64,
    pub billing_frequency: BillingFrequency,
}

/// Cart line item, discriminated by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CartItem {
    Meal(MealLineItem),
    Subscription(SubscriptionLineItem),
}

impl CartItem {
    /// Contribution to the cart count
    pub fn count(&self) -> u32 {
        match self {
            CartItem::Meal(meal) => meal.quantity,
            CartItem::Subscription(_) => 1,
        }
    }

    /// Price contribution to the cart subtotal
    pub fn line_total(&self) -> f64 {
        match self {
            CartItem::Meal(meal) => meal.line_total(),
            CartItem::Subscription(sub) => sub.total_cost,
        }
    }
}
