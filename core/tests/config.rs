//! Configuration tests: file loading, overrides and validation.

use saas_metrics_core::{
    config::{AlertThresholds, DashboardConfig, Environment, ValidationMode},
    error::MetricsError,
};
use std::collections::HashMap;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key: &str| map.get(key).cloned()
}

/// A fresh data dir under the system temp dir, containing `config/dashboard.json`
/// when `json` is given.
fn data_dir(name: &str, json: Option<&str>) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("saas_config_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("config")).unwrap();
    if let Some(json) = json {
        std::fs::write(dir.join("config").join("dashboard.json"), json).unwrap();
    }
    dir
}

// ── Defaults & loading ───────────────────────────────────────────────────────

#[test]
fn defaults_match_documented_thresholds() {
    let config = DashboardConfig::default();
    assert_eq!(config.thresholds, AlertThresholds { max_churn: 0.05, revenue_goal: 60_000.0, min_ltv: 1_000.0 });
    assert_eq!(config.etl.validation, ValidationMode::Strict);
    assert_eq!(config.etl.cache_ttl_secs, 300);
    assert_eq!(config.dashboard.page_size, 50);
    assert!(config.validate().is_ok());
}

/// Sections missing from the file keep their defaults.
#[test]
fn partial_file_fills_in_defaults() {
    let dir = data_dir(
        "partial",
        Some(r#"{ "thresholds": { "revenue_goal": 80000.0 }, "etl": { "validation": "skip_invalid" } }"#),
    );
    let config = DashboardConfig::load(dir.to_str().unwrap()).unwrap();

    assert_eq!(config.thresholds.revenue_goal, 80_000.0);
    assert_eq!(config.thresholds.max_churn, 0.05);
    assert_eq!(config.etl.validation, ValidationMode::SkipInvalid);
    assert_eq!(config.database.path, "data/saas.db");
    assert_eq!(config.environment, Environment::Development);
    let _ = std::fs::remove_dir_all(&dir);
}

/// No file at all is not an error.
#[test]
fn missing_file_uses_defaults() {
    let dir = data_dir("missing", None);
    let config = DashboardConfig::load(dir.to_str().unwrap()).unwrap();
    assert_eq!(config.dashboard.title, "SaaS Analytics");
    let _ = std::fs::remove_dir_all(&dir);
}

/// A file that is not JSON is reported, not ignored.
#[test]
fn unparseable_file_is_an_error() {
    let dir = data_dir("garbage", Some("thresholds = 1"));
    let err = DashboardConfig::load(dir.to_str().unwrap()).unwrap_err();
    assert!(err.to_string().contains("Cannot parse"), "got {err}");
    let _ = std::fs::remove_dir_all(&dir);
}

// ── Overrides ────────────────────────────────────────────────────────────────

#[test]
fn overrides_replace_file_values() {
    let mut config = DashboardConfig::default();
    config
        .apply_overrides(lookup(&[
            ("SAAS_DB_PATH", "/tmp/other.db"),
            ("SAAS_MAX_CHURN", "0.08"),
            ("SAAS_CACHE_TTL_SECS", "60"),
        ]))
        .unwrap();

    assert_eq!(config.database.path, "/tmp/other.db");
    assert_eq!(config.thresholds.max_churn, 0.08);
    assert_eq!(config.etl.cache_ttl_secs, 60);
    assert_eq!(config.thresholds.revenue_goal, 60_000.0, "untouched keys keep their value");
}

#[test]
fn non_numeric_override_is_rejected() {
    let mut config = DashboardConfig::default();
    let err = config
        .apply_overrides(lookup(&[("SAAS_REVENUE_GOAL", "lots")]))
        .unwrap_err();
    assert!(err.to_string().contains("SAAS_REVENUE_GOAL"), "got {err}");
}

/// `SAAS_ENV` selects the deployment environment, case-insensitively.
#[test]
fn environment_override_is_parsed() {
    let mut config = DashboardConfig::default();
    config.apply_overrides(lookup(&[("SAAS_ENV", "Production")])).unwrap();
    assert_eq!(config.environment, Environment::Production);

    let err = config.apply_overrides(lookup(&[("SAAS_ENV", "qa")])).unwrap_err();
    assert!(err.to_string().contains("SAAS_ENV"), "got {err}");
}

// ── Validation ───────────────────────────────────────────────────────────────

/// Churn limits outside (0, 1] and non-positive goals are configuration errors.
#[test]
fn out_of_range_thresholds_are_invalid() {
    for bad in [
        AlertThresholds { max_churn: 0.0, ..Default::default() },
        AlertThresholds { max_churn: 1.5, ..Default::default() },
        AlertThresholds { revenue_goal: -1.0, ..Default::default() },
        AlertThresholds { min_ltv: 0.0, ..Default::default() },
    ] {
        let err = bad.validate().unwrap_err();
        assert!(matches!(err, MetricsError::InvalidConfig(_)), "{bad:?} gave {err:?}");
    }
}

#[test]
fn zero_page_size_is_invalid() {
    let mut config = DashboardConfig::default_test();
    config.dashboard.page_size = 0;
    assert!(matches!(config.validate(), Err(MetricsError::InvalidConfig(_))));
}
