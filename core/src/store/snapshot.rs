use super::DashboardStore;
use crate::{error::MetricsResult, kpi::AggregateMetrics};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

/// One persisted pipeline result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiSnapshotRow {
    pub run_id:         String,
    pub computed_at:    String,
    pub reference_date: String,
    pub metrics:        AggregateMetrics,
    pub alert_count:    i64,
    pub critical_count: i64,
}

const SNAPSHOT_COLUMNS: &str = "run_id, computed_at, reference_date, mrr, arr, total_customers,
                                active_customers, trial_customers, cancelled_customers,
                                churn_rate, average_ltv, average_ticket, alert_count, critical_count";

fn snapshot_row(row: &Row<'_>) -> rusqlite::Result<KpiSnapshotRow> {
    Ok(KpiSnapshotRow {
        run_id:         row.get(0)?,
        computed_at:    row.get(1)?,
        reference_date: row.get(2)?,
        metrics: AggregateMetrics {
            mrr:                 row.get(3)?,
            arr:                 row.get(4)?,
            total_customers:     row.get::<_, i64>(5)? as usize,
            active_customers:    row.get::<_, i64>(6)? as usize,
            trial_customers:     row.get::<_, i64>(7)? as usize,
            cancelled_customers: row.get::<_, i64>(8)? as usize,
            churn_rate:          row.get(9)?,
            average_ltv:         row.get(10)?,
            average_ticket:      row.get(11)?,
        },
        alert_count:    row.get(12)?,
        critical_count: row.get(13)?,
    })
}

impl DashboardStore {
    // ── KPI snapshots ──────────────────────────────────────────

    pub fn save_kpi_snapshot(&self, snapshot: &KpiSnapshotRow) -> MetricsResult<()> {
        let m = &snapshot.metrics;
        self.conn.execute(
            &format!(
                "INSERT INTO kpi_snapshot ({SNAPSHOT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                snapshot.run_id,
                snapshot.computed_at,
                snapshot.reference_date,
                m.mrr,
                m.arr,
                m.total_customers as i64,
                m.active_customers as i64,
                m.trial_customers as i64,
                m.cancelled_customers as i64,
                m.churn_rate,
                m.average_ltv,
                m.average_ticket,
                snapshot.alert_count,
                snapshot.critical_count,
            ],
        )?;
        Ok(())
    }

    /// All snapshots, oldest first.
    pub fn kpi_snapshots(&self) -> MetricsResult<Vec<KpiSnapshotRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM kpi_snapshot ORDER BY computed_at ASC, rowid ASC"
        ))?;
        let rows = stmt
            .query_map([], snapshot_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn latest_kpi_snapshot(&self) -> MetricsResult<Option<KpiSnapshotRow>> {
        let snapshot = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM kpi_snapshot
                     ORDER BY computed_at DESC, rowid DESC LIMIT 1"
                ),
                [],
                snapshot_row,
            )
            .optional()?;
        Ok(snapshot)
    }
}
