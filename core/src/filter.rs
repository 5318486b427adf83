//! Row filters applied before KPIs, alerts and exports are computed.
//!
//! An unset dimension matches everything; a set dimension matches only the
//! listed values, so an explicitly empty set matches nothing.

use crate::{
    kpi::AsRecord,
    subscription::{SubscriptionRecord, SubscriptionStatus},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionFilter {
    pub plans:        Option<BTreeSet<String>>,
    pub statuses:     Option<BTreeSet<SubscriptionStatus>>,
    /// Inclusive lower bound on `start_date`.
    pub started_from: Option<NaiveDate>,
    /// Inclusive upper bound on `start_date`.
    pub started_to:   Option<NaiveDate>,
}

impl SubscriptionFilter {
    pub fn with_plans<I, S>(mut self, plans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.plans = Some(plans.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_statuses<I>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = SubscriptionStatus>,
    {
        self.statuses = Some(statuses.into_iter().collect());
        self
    }

    pub fn started_between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.started_from = from;
        self.started_to = to;
        self
    }

    /// True when no dimension is constrained.
    pub fn is_unrestricted(&self) -> bool {
        self.plans.is_none()
            && self.statuses.is_none()
            && self.started_from.is_none()
            && self.started_to.is_none()
    }

    pub fn matches(&self, record: &SubscriptionRecord) -> bool {
        if let Some(plans) = &self.plans {
            if !plans.contains(&record.plan_name) {
                return false;
            }
        }
        if let Some(statuses) = &self.statuses {
            if !statuses.contains(&record.status) {
                return false;
            }
        }
        if self.started_from.is_some_and(|from| record.start_date < from) {
            return false;
        }
        if self.started_to.is_some_and(|to| record.start_date > to) {
            return false;
        }
        true
    }

    /// Rows that pass the filter, in their original order.
    pub fn apply<R: AsRecord + Clone>(&self, rows: &[R]) -> Vec<R> {
        rows.iter().filter(|r| self.matches(r.record())).cloned().collect()
    }
}

/// Distinct plan names present in `rows`, sorted.
pub fn available_plans<R: AsRecord>(rows: &[R]) -> BTreeSet<String> {
    rows.iter().map(|r| r.record().plan_name.clone()).collect()
}
