use super::{DashboardStore, PlanRow};
use crate::error::MetricsResult;
use rusqlite::params;

impl DashboardStore {
    // ── Plans ──────────────────────────────────────────────────

    /// Insert a plan, leaving an existing plan with the same id untouched.
    pub fn insert_plan(&self, plan: &PlanRow) -> MetricsResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO plan (plan_id, name, monthly_price, user_limit, storage_limit_gb)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                plan.plan_id,
                plan.name,
                plan.monthly_price,
                plan.user_limit,
                plan.storage_limit_gb,
            ],
        )?;
        Ok(())
    }

    pub fn plans(&self) -> MetricsResult<Vec<PlanRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT plan_id, name, monthly_price, user_limit, storage_limit_gb
             FROM plan ORDER BY plan_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PlanRow {
                    plan_id:          row.get(0)?,
                    name:             row.get(1)?,
                    monthly_price:    row.get(2)?,
                    user_limit:       row.get(3)?,
                    storage_limit_gb: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Companies & users ──────────────────────────────────────

    /// Returns the new company id.
    pub fn insert_company(
        &self,
        legal_name: &str,
        tax_id: Option<&str>,
        created_on: &str,
    ) -> MetricsResult<i64> {
        self.conn.execute(
            "INSERT INTO company (legal_name, tax_id, created_on) VALUES (?1, ?2, ?3)",
            params![legal_name, tax_id, created_on],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Returns the new user id.
    pub fn insert_user(
        &self,
        name: &str,
        email: &str,
        role: &str,
        company_id: i64,
    ) -> MetricsResult<i64> {
        self.conn.execute(
            "INSERT INTO app_user (name, email, role, company_id) VALUES (?1, ?2, ?3, ?4)",
            params![name, email, role, company_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn company_count(&self) -> MetricsResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM company", [], |row| row.get(0))
            .map_err(Into::into)
    }

    pub fn user_count(&self) -> MetricsResult<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM app_user", [], |row| row.get(0))
            .map_err(Into::into)
    }
}
