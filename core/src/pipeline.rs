//! Extract → transform → load.
//!
//!   1. Extract: raw rows from a `SubscriptionSource`, validated into records
//!   2. Transform: per-row tenure and LTV at a reference date
//!   3. Evaluate: aggregate metrics, revenue by plan, alerts
//!   4. Load: CSV report on disk, then the KPI snapshot row in the store
//!
//! Failures propagate as `MetricsError`; nothing here swallows an error and
//! returns an empty result in its place.

use crate::{
    alerts::{evaluate, has_critical, Alert, AlertSeverity},
    config::{DashboardConfig, ValidationMode},
    error::MetricsResult,
    export::{write_export, ExportFormat},
    kpi::{compute_ltv, compute_metrics, revenue_by_plan, AggregateMetrics, EnrichedSubscription},
    source::SubscriptionSource,
    store::{DashboardStore, KpiSnapshotRow},
    subscription::SubscriptionRecord,
    types::RunId,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row_id: Option<i64>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<SubscriptionRecord>,
    /// Always empty under `ValidationMode::Strict`.
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id:          RunId,
    pub reference_date:  NaiveDate,
    pub rows_extracted:  usize,
    pub skipped:         Vec<SkippedRow>,
    pub metrics:         AggregateMetrics,
    pub revenue_by_plan: BTreeMap<String, f64>,
    pub alerts:          Vec<Alert>,
    pub report_path:     Option<PathBuf>,
}

// ── Stages ───────────────────────────────────────────────────────────────────

/// Read every row from `source` and validate it against `today`.
pub fn extract<S>(source: &S, mode: ValidationMode, today: NaiveDate) -> MetricsResult<Extraction>
where
    S: SubscriptionSource + ?Sized,
{
    let rows = source.fetch_rows()?;
    log::info!("pipeline: extracted {} rows from {}", rows.len(), source.name());

    let mut extraction = Extraction::default();
    for row in &rows {
        match SubscriptionRecord::from_row(row, today) {
            Ok(record) => extraction.records.push(record),
            Err(e) if mode == ValidationMode::SkipInvalid && e.is_malformed_input() => {
                log::warn!("pipeline: skipping row {:?}: {e}", row.subscription_id);
                extraction.skipped.push(SkippedRow {
                    row_id: row.subscription_id,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(extraction)
}

/// Derive per-row fields. Empty in, empty out.
pub fn transform(records: &[SubscriptionRecord], reference: NaiveDate) -> Vec<EnrichedSubscription> {
    if records.is_empty() {
        log::warn!("pipeline: no rows to transform");
    }
    compute_ltv(records, reference)
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

pub struct EtlPipeline<'a> {
    store:  &'a DashboardStore,
    config: &'a DashboardConfig,
}

impl<'a> EtlPipeline<'a> {
    pub fn new(store: &'a DashboardStore, config: &'a DashboardConfig) -> Self {
        Self { store, config }
    }

    pub fn extract(&self, today: NaiveDate) -> MetricsResult<Extraction> {
        extract(self.store, self.config.etl.validation, today)
    }

    /// Write the CSV report. Returns `None` when there is nothing to write.
    pub fn load(&self, rows: &[EnrichedSubscription], path: &Path) -> MetricsResult<Option<PathBuf>> {
        if rows.is_empty() {
            log::warn!("pipeline: no rows, report not written");
            return Ok(None);
        }
        write_export(path, rows, ExportFormat::Csv).map(Some)
    }

    /// Run every stage at `reference` and record the result.
    pub fn run(&self, reference: NaiveDate) -> MetricsResult<PipelineReport> {
        let run_id: RunId = uuid::Uuid::new_v4().to_string();
        log::info!("pipeline: run {run_id} starting (reference={reference})");

        let extraction = self.extract(reference)?;
        let enriched = transform(&extraction.records, reference);

        let metrics = compute_metrics(&enriched);
        let by_plan = revenue_by_plan(&enriched);
        let alerts = evaluate(&enriched, &self.config.thresholds);

        // Report first: a failed export must not leave a snapshot behind.
        let report_path = self.load(&enriched, Path::new(&self.config.output.report_path))?;

        let snapshot = KpiSnapshotRow {
            run_id:         run_id.clone(),
            computed_at:    Utc::now().to_rfc3339(),
            reference_date: reference.to_string(),
            metrics,
            alert_count:    alerts.len() as i64,
            critical_count: alerts.iter().filter(|a| a.severity == AlertSeverity::Critical).count() as i64,
        };
        self.store.save_kpi_snapshot(&snapshot)?;

        if has_critical(&alerts) {
            log::warn!("pipeline: run {run_id} raised {} critical alerts", snapshot.critical_count);
        }
        log::info!(
            "pipeline: run {run_id} complete: {} rows, mrr={:.2}, churn={:.4}, {} alerts",
            enriched.len(),
            metrics.mrr,
            metrics.churn_rate,
            alerts.len(),
        );

        Ok(PipelineReport {
            run_id,
            reference_date: reference,
            rows_extracted: extraction.records.len(),
            skipped: extraction.skipped,
            metrics,
            revenue_by_plan: by_plan,
            alerts,
            report_path,
        })
    }
}
