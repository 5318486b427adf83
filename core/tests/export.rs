//! Export tests: CSV layout and quoting, JSON shape, file naming, summary.

use chrono::{Duration, Local, NaiveDate, TimeZone};
use saas_metrics_core::{
    export::{
        default_file_name, summary_report, to_csv, to_json, to_spreadsheet_csv, write_export,
        ExportFormat, CSV_HEADER,
    },
    kpi::{compute_ltv, EnrichedSubscription},
    subscription::{SubscriptionRecord, SubscriptionStatus},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn rows() -> Vec<EnrichedSubscription> {
    let records = vec![
        SubscriptionRecord {
            id: 1,
            company_id: Some(10),
            company_name: "Acme, Inc.".into(),
            plan_name: "Pro".into(),
            status: SubscriptionStatus::Active,
            start_date: reference() - Duration::days(60),
            next_billing_date: NaiveDate::from_ymd_opt(2025, 6, 2),
            monthly_price: 100.0,
        },
        SubscriptionRecord {
            id: 2,
            company_id: Some(11),
            company_name: "The \"Best\" Labs".into(),
            plan_name: "Basic".into(),
            status: SubscriptionStatus::Cancelled,
            start_date: reference() - Duration::days(30),
            next_billing_date: None,
            monthly_price: 50.0,
        },
    ];
    compute_ltv(&records, reference())
}

// ── CSV ──────────────────────────────────────────────────────────────────────

/// Header first, then one line per row with derived fields at two decimals.
#[test]
fn csv_has_header_and_rows() {
    let csv = to_csv(&rows());
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER.join(","));
    assert_eq!(lines[1], "1,\"Acme, Inc.\",Pro,active,2025-04-02,2025-06-02,100.00,60,200.00");
}

/// Embedded quotes are doubled and the field wrapped; a missing billing date
/// is an empty field.
#[test]
fn csv_escapes_quotes() {
    let csv = to_csv(&rows());
    let line = csv.lines().nth(2).unwrap();
    assert_eq!(line, "2,\"The \"\"Best\"\" Labs\",Basic,cancelled,2025-05-02,,50.00,30,50.00");
}

/// Spreadsheet CSV is the plain CSV behind a UTF-8 BOM.
#[test]
fn spreadsheet_csv_starts_with_bom() {
    let bytes = to_spreadsheet_csv(&rows());
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    assert_eq!(&bytes[3..], to_csv(&rows()).as_bytes());
}

/// An empty export is still a valid CSV: just the header.
#[test]
fn empty_csv_is_header_only() {
    assert_eq!(to_csv(&[]), format!("{}\n", CSV_HEADER.join(",")));
}

// ── JSON & files ─────────────────────────────────────────────────────────────

/// JSON rows are flat: record fields sit beside the derived ones.
#[test]
fn json_rows_are_flat() {
    let json = to_json(&rows()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let first = &value[0];
    assert_eq!(first["id"], 1);
    assert_eq!(first["status"], "active");
    assert_eq!(first["tenure_days"], 60);
    assert_eq!(first["estimated_ltv"], 200.0);
    assert!(first.get("record").is_none(), "record should be flattened");
}

#[test]
fn default_file_name_uses_timestamp() {
    let now = Local.with_ymd_and_hms(2025, 6, 14, 9, 30, 0).unwrap();
    assert_eq!(default_file_name(ExportFormat::Csv, now), "report_20250614_093000.csv");
    assert_eq!(default_file_name(ExportFormat::Json, now), "report_20250614_093000.json");
}

/// Writing creates missing directories and the JSON file parses back.
#[test]
fn write_export_creates_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("saas_export_{}", std::process::id()));
    let path = dir.join("nested").join("rows.json");
    let _ = std::fs::remove_dir_all(&dir);

    let written = write_export(&path, &rows(), ExportFormat::Json).unwrap();
    assert_eq!(written, path);

    let back: Vec<EnrichedSubscription> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(back, rows());
    let _ = std::fs::remove_dir_all(&dir);
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[test]
fn summary_lists_headline_figures() {
    let summary = summary_report(&rows());
    assert_eq!(summary.len(), 7);
    assert_eq!(summary[0].label, "Total records");
    assert_eq!(summary[0].value, 2.0);
    assert_eq!(summary[1].value, 100.0, "cancelled row is not recurring revenue");
    assert_eq!(summary[5].label, "Churn rate (%)");
    assert_eq!(summary[5].value, 50.0);
}

#[test]
fn summary_of_nothing_is_empty() {
    assert!(summary_report(&[]).is_empty());
}
