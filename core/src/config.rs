use crate::error::{MetricsError, MetricsResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path:         String,
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "data/saas.db".into(), timeout_secs: 30 }
    }
}

/// How the pipeline treats rows that fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// First malformed row aborts the extraction.
    Strict,
    /// Malformed rows are logged and dropped.
    SkipInvalid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    pub validation:     ValidationMode,
    /// How long a presentation layer may reuse an extracted row set.
    pub cache_ttl_secs: u64,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self { validation: ValidationMode::Strict, cache_ttl_secs: 300 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub title:     String,
    pub page_size: usize,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self { title: "SaaS Analytics".into(), page_size: 50 }
    }
}

/// Targets the alert evaluator measures against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Highest acceptable churn rate, in (0, 1].
    pub max_churn:    f64,
    /// Monthly recurring revenue goal.
    pub revenue_goal: f64,
    /// Lowest acceptable average lifetime value.
    pub min_ltv:      f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self { max_churn: 0.05, revenue_goal: 60_000.0, min_ltv: 1_000.0 }
    }
}

impl AlertThresholds {
    pub fn validate(&self) -> MetricsResult<()> {
        if !(self.max_churn > 0.0 && self.max_churn <= 1.0) {
            return Err(MetricsError::InvalidConfig(format!(
                "max_churn must be in (0, 1], got {}", self.max_churn
            )));
        }
        if !(self.revenue_goal > 0.0 && self.revenue_goal.is_finite()) {
            return Err(MetricsError::InvalidConfig(format!(
                "revenue_goal must be positive, got {}", self.revenue_goal
            )));
        }
        if !(self.min_ltv > 0.0 && self.min_ltv.is_finite()) {
            return Err(MetricsError::InvalidConfig(format!(
                "min_ltv must be positive, got {}", self.min_ltv
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// One of error, warn, info, debug, trace.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where the pipeline writes its CSV report.
    pub report_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { report_path: "data/financial_report.csv".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub environment: Environment,
    pub database:    DatabaseConfig,
    pub etl:         EtlConfig,
    pub dashboard:   PresentationConfig,
    pub thresholds:  AlertThresholds,
    pub log:         LogConfig,
    pub output:      OutputConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            database:    DatabaseConfig::default(),
            etl:         EtlConfig::default(),
            dashboard:   PresentationConfig::default(),
            thresholds:  AlertThresholds::default(),
            log:         LogConfig::default(),
            output:      OutputConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load from `{data_dir}/config/dashboard.json`, then apply `SAAS_*`
    /// environment overrides. A missing file falls back to defaults.
    /// In tests, use DashboardConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/config/dashboard.json");
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Self>(&content)
                .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("config: {path} not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(anyhow::anyhow!("Cannot read {path}: {e}")),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SAAS_ENV") {
            self.environment = serde_json::from_value(serde_json::Value::String(v.to_ascii_lowercase()))
                .map_err(|_| anyhow::anyhow!("SAAS_ENV='{v}': expected development, staging or production"))?;
        }
        if let Some(v) = lookup("SAAS_DB_PATH") {
            self.database.path = v;
        }
        if let Some(v) = lookup("SAAS_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Some(v) = lookup("SAAS_REPORT_PATH") {
            self.output.report_path = v;
        }
        if let Some(v) = lookup("SAAS_CACHE_TTL_SECS") {
            self.etl.cache_ttl_secs = v
                .parse()
                .map_err(|e| anyhow::anyhow!("SAAS_CACHE_TTL_SECS='{v}': {e}"))?;
        }
        if let Some(v) = lookup("SAAS_MAX_CHURN") {
            self.thresholds.max_churn = v
                .parse()
                .map_err(|e| anyhow::anyhow!("SAAS_MAX_CHURN='{v}': {e}"))?;
        }
        if let Some(v) = lookup("SAAS_REVENUE_GOAL") {
            self.thresholds.revenue_goal = v
                .parse()
                .map_err(|e| anyhow::anyhow!("SAAS_REVENUE_GOAL='{v}': {e}"))?;
        }
        if let Some(v) = lookup("SAAS_MIN_LTV") {
            self.thresholds.min_ltv = v
                .parse()
                .map_err(|e| anyhow::anyhow!("SAAS_MIN_LTV='{v}': {e}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> MetricsResult<()> {
        self.thresholds.validate()?;
        if self.dashboard.page_size == 0 {
            return Err(MetricsError::InvalidConfig("dashboard.page_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            database: DatabaseConfig { path: ":memory:".into(), timeout_secs: 5 },
            output: OutputConfig {
                report_path: std::env::temp_dir()
                    .join("saas_metrics_test_report.csv")
                    .to_string_lossy()
                    .into_owned(),
            },
            log: LogConfig { level: "debug".into() },
            ..Self::default()
        }
    }
}
