//! Subscription plan listing

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::StorefrontResult;
use crate::models::BillingFrequency;
use crate::plans::{plans, Plan};
use crate::pricing::{format_currency, PricingQuote};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PlansQuery {
    #[serde(default)]
    pub billing: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    #[serde(flatten)]
    pub plan: Plan,
    pub billing_frequency: BillingFrequency,
    pub quote: PricingQuote,
    pub total: f64,
    pub formatted_total: String,
}

/// GET /api/plans?billing=weekly|monthly
pub async fn list_plans(
    State(_state): State<AppState>,
    Query(query): Query<PlansQuery>,
) -> StorefrontResult<Json<Vec<PlanView>>> {
    let billing = match query.billing.as_deref() {
        Some(raw) => raw.parse()?,
        None => BillingFrequency::default(),
    };

    let views = plans()
        .iter()
        .map(|plan| {
            let total = plan.displayed_total(billing);
            PlanView {
                plan: plan.clone(),
                billing_frequency: billing,
                quote: plan.quote(billing),
                total,
                formatted_total: format_currency(total),
            }
        })
        .collect();

    Ok(Json(views))
}
