//! Export formatting: CSV and JSON renderings of an enriched row set, plus
//! the short summary table shown next to the exported data.

use crate::{
    error::MetricsResult,
    kpi::{compute_metrics, EnrichedSubscription},
};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CSV_HEADER: [&str; 9] = [
    "subscription_id",
    "company_name",
    "plan_name",
    "status",
    "start_date",
    "next_billing_date",
    "monthly_price",
    "tenure_days",
    "estimated_ltv",
];

/// Byte-order mark that makes spreadsheet tools read the CSV as UTF-8.
const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv  => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub label: String,
    pub value: f64,
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub fn to_csv(rows: &[EnrichedSubscription]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for r in rows {
        let rec = &r.record;
        let fields = [
            rec.id.to_string(),
            csv_field(&rec.company_name),
            csv_field(&rec.plan_name),
            rec.status.as_str().to_string(),
            rec.start_date.to_string(),
            rec.next_billing_date.map(|d| d.to_string()).unwrap_or_default(),
            format!("{:.2}", rec.monthly_price),
            r.tenure_days.to_string(),
            format!("{:.2}", r.estimated_ltv),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }

    log::info!("export: csv generated, {} rows", rows.len());
    out
}

/// CSV prefixed with a UTF-8 byte-order mark.
pub fn to_spreadsheet_csv(rows: &[EnrichedSubscription]) -> Vec<u8> {
    let mut bytes = UTF8_BOM.as_bytes().to_vec();
    bytes.extend_from_slice(to_csv(rows).as_bytes());
    bytes
}

pub fn to_json(rows: &[EnrichedSubscription]) -> MetricsResult<String> {
    let json = serde_json::to_string_pretty(rows)?;
    log::info!("export: json generated, {} rows", rows.len());
    Ok(json)
}

/// `report_20250614_093000.csv`
pub fn default_file_name(format: ExportFormat, now: DateTime<Local>) -> String {
    format!("report_{}.{}", now.format("%Y%m%d_%H%M%S"), format.extension())
}

/// Render `rows` and write them to `path`, creating parent directories.
pub fn write_export(
    path: &Path,
    rows: &[EnrichedSubscription],
    format: ExportFormat,
) -> MetricsResult<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let bytes = match format {
        ExportFormat::Csv  => to_spreadsheet_csv(rows),
        ExportFormat::Json => to_json(rows)?.into_bytes(),
    };
    std::fs::write(path, bytes)?;

    log::info!("export: wrote {} rows to {}", rows.len(), path.display());
    Ok(path.to_path_buf())
}

/// Headline figures for a row set. Empty input gives an empty summary.
pub fn summary_report(rows: &[EnrichedSubscription]) -> Vec<SummaryLine> {
    if rows.is_empty() {
        return Vec::new();
    }

    let m = compute_metrics(rows);
    let line = |label: &str, value: f64| SummaryLine { label: label.into(), value };
    vec![
        line("Total records", m.total_customers as f64),
        line("Monthly recurring revenue", m.mrr),
        line("Average ticket", m.average_ticket),
        line("Active customers", m.active_customers as f64),
        line("Cancelled customers", m.cancelled_customers as f64),
        line("Churn rate (%)", m.churn_rate * 100.0),
        line("Average LTV", m.average_ltv),
    ]
}
