use super::{DashboardStore, NewSubscription};
use crate::{error::MetricsResult, subscription::SubscriptionRow};
use rusqlite::{params, Row};
use std::collections::BTreeMap;

const DETAIL_COLUMNS: &str = "subscription_id, company_id, company_name, tax_id, plan_name,
                              status, start_date, next_billing_date, monthly_price";

fn detail_row(row: &Row<'_>) -> rusqlite::Result<SubscriptionRow> {
    Ok(SubscriptionRow {
        subscription_id:   row.get(0)?,
        company_id:        row.get(1)?,
        company_name:      row.get(2)?,
        tax_id:            row.get(3)?,
        plan_name:         row.get(4)?,
        status:            row.get(5)?,
        start_date:        row.get(6)?,
        next_billing_date: row.get(7)?,
        monthly_price:     row.get(8)?,
    })
}

impl DashboardStore {
    // ── Subscriptions ──────────────────────────────────────────

    /// Returns the new subscription id.
    pub fn insert_subscription(&self, s: &NewSubscription) -> MetricsResult<i64> {
        self.conn.execute(
            "INSERT INTO subscription (
                status, start_date, renewal_date, next_billing_date, company_id, plan_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                s.status,
                s.start_date,
                s.renewal_date,
                s.next_billing_date,
                s.company_id,
                s.plan_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Every row of `vw_subscription_details`, newest start first.
    pub fn fetch_subscriptions(&self) -> MetricsResult<Vec<SubscriptionRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DETAIL_COLUMNS}
             FROM vw_subscription_details
             ORDER BY start_date DESC, subscription_id ASC"
        ))?;
        let rows = stmt
            .query_map([], detail_row)?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("store: fetched {} subscription rows", rows.len());
        Ok(rows)
    }

    pub fn subscriptions_by_status(&self, status: &str) -> MetricsResult<Vec<SubscriptionRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DETAIL_COLUMNS}
             FROM vw_subscription_details
             WHERE status = ?1
             ORDER BY start_date DESC, subscription_id ASC"
        ))?;
        let rows = stmt
            .query_map(params![status], detail_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Subscription count per plan name.
    pub fn count_by_plan(&self) -> MetricsResult<BTreeMap<String, i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT plan_name, COUNT(*) FROM vw_subscription_details GROUP BY plan_name",
        )?;
        let counts = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(counts)
    }

    pub fn subscription_count(&self) -> MetricsResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM subscription", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
