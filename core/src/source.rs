//! The tabular data source seam.
//!
//! The pipeline only needs "give me every subscription row"; the SQLite store
//! is the production implementation, and an in-memory slice of rows serves
//! fixtures and tests.

use crate::{error::MetricsResult, store::DashboardStore, subscription::SubscriptionRow};

pub trait SubscriptionSource {
    /// Short label for log lines.
    fn name(&self) -> &'static str;

    /// Every raw row, in the source's natural order.
    fn fetch_rows(&self) -> MetricsResult<Vec<SubscriptionRow>>;
}

impl SubscriptionSource for DashboardStore {
    fn name(&self) -> &'static str { "sqlite" }

    fn fetch_rows(&self) -> MetricsResult<Vec<SubscriptionRow>> {
        self.fetch_subscriptions()
    }
}

impl SubscriptionSource for [SubscriptionRow] {
    fn name(&self) -> &'static str { "memory" }

    fn fetch_rows(&self) -> MetricsResult<Vec<SubscriptionRow>> {
        Ok(self.to_vec())
    }
}

impl SubscriptionSource for Vec<SubscriptionRow> {
    fn name(&self) -> &'static str { "memory" }

    fn fetch_rows(&self) -> MetricsResult<Vec<SubscriptionRow>> {
        Ok(self.clone())
    }
}
