//! Meal filtering and pagination
//!
//! [`filter_meals`] is the pure core: the same catalog and inputs always
//! produce the same view. [`MealFilterEngine`] holds browse state around it,
//! debouncing search text and the quick filter so the view is recomputed only
//! after typing pauses.

use crate::debounce::Debounced;
use crate::models::Meal;
use crate::pagination::calculate_pagination;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::time::Instant;

/// Quick filter matching every meal
pub const QUICK_FILTER_ALL: &str = "all";
/// Quick filter matching meals flagged as new
pub const QUICK_FILTER_NEW: &str = "new";

/// Everything the filtered view depends on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterInputs {
    pub search: String,
    pub quick_filter: String,
    pub detail_filters: BTreeSet<String>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for FilterInputs {
    fn default() -> Self {
        Self {
            search: String::new(),
            quick_filter: QUICK_FILTER_ALL.to_string(),
            detail_filters: BTreeSet::new(),
            page: 1,
            page_size: 9,
        }
    }
}

impl FilterInputs {
    pub fn has_filters(&self) -> bool {
        !self.search.trim().is_empty()
            || self.quick_filter != QUICK_FILTER_ALL
            || !self.detail_filters.is_empty()
    }
}

/// One page of filtered meals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterView {
    pub meals: Vec<Meal>,
    pub total_results: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_filters: bool,
}

fn matches_quick_filter(meal: &Meal, tag: &str) -> bool {
    tag == QUICK_FILTER_ALL || (tag == QUICK_FILTER_NEW && meal.is_new) || meal.in_category(tag)
}

fn matches_detail_filters(meal: &Meal, filters: &BTreeSet<String>) -> bool {
    filters.iter().all(|f| meal.has_tag(f))
}

fn matches_search(meal: &Meal, search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    meal.name.to_lowercase().contains(&needle)
        || meal.description.to_lowercase().contains(&needle)
        || meal.tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

/// Filter and paginate `meals`
pub fn filter_meals(meals: &[Meal], inputs: &FilterInputs) -> FilterView {
    let matching: Vec<&Meal> = meals
        .iter()
        .filter(|m| matches_quick_filter(m, &inputs.quick_filter))
        .filter(|m| matches_detail_filters(m, &inputs.detail_filters))
        .filter(|m| matches_search(m, &inputs.search))
        .collect();

    let page_size = inputs.page_size.max(1);
    let pagination = calculate_pagination(matching.len(), inputs.page, page_size);

    FilterView {
        meals: matching[pagination.range()].iter().map(|m| (*m).clone()).collect(),
        total_results: matching.len(),
        total_pages: pagination.total_pages,
        page: pagination.page,
        page_size,
        has_filters: inputs.has_filters(),
    }
}

/// Browse state with debounced search and quick filter
#[derive(Debug)]
pub struct MealFilterEngine {
    search: Debounced<String>,
    quick_filter: Debounced<String>,
    detail_filters: BTreeSet<String>,
    page: usize,
    page_size: usize,
}

impl MealFilterEngine {
    pub fn new(page_size: usize, quiet: Duration) -> Self {
        Self {
            search: Debounced::new(String::new(), quiet),
            quick_filter: Debounced::new(QUICK_FILTER_ALL.to_string(), quiet),
            detail_filters: BTreeSet::new(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn set_search(&mut self, text: impl Into<String>, now: Instant) {
        self.search.set(text.into(), now);
    }

    pub fn set_quick_filter(&mut self, tag: impl Into<String>, now: Instant) {
        self.quick_filter.set(tag.into(), now);
    }

    /// Replace the detail tag filters; applies immediately
    pub fn set_detail_filters(&mut self, filters: BTreeSet<String>) {
        if filters != self.detail_filters {
            self.detail_filters = filters;
            self.page = 1;
        }
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Apply debounced inputs whose quiet period has elapsed
    ///
    /// Any applied change resets the page to 1.
    pub fn settle(&mut self, now: Instant) -> bool {
        let search_changed = self.search.settle(now);
        let quick_changed = self.quick_filter.settle(now);
        let changed = search_changed || quick_changed;
        if changed {
            self.page = 1;
        }
        changed
    }

    /// Settled inputs (what the current view is computed from)
    pub fn inputs(&self) -> FilterInputs {
        FilterInputs {
            search: self.search.settled().clone(),
            quick_filter: self.quick_filter.settled().clone(),
            detail_filters: self.detail_filters.clone(),
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Earliest instant at which a pending input settles
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.search.deadline(), self.quick_filter.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.search.is_pending() || self.quick_filter.is_pending()
    }

    /// Latest typed search text, settled or not
    pub fn search_text(&self) -> &str {
        self.search.latest()
    }

    pub fn quick_filter(&self) -> &str {
        self.quick_filter.latest()
    }

    /// Settle, then recompute the view over `meals`
    pub fn view(&mut self, meals: &[Meal], now: Instant) -> FilterView {
        self.settle(now);
        let view = filter_meals(meals, &self.inputs());
        self.page = view.page;
        view
    }
}
