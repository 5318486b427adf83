//! Subscription rows: the raw shape read from the store and the validated
//! record every calculation works on.

use crate::{
    error::{MetricsError, MetricsResult},
    types::{CompanyId, SubscriptionId},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

// ── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Trial,
    Inactive,
}

impl SubscriptionStatus {
    pub const ALL: [SubscriptionStatus; 4] = [
        Self::Active,
        Self::Cancelled,
        Self::Trial,
        Self::Inactive,
    ];

    /// Label stored in the `subscription.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active    => "active",
            Self::Cancelled => "cancelled",
            Self::Trial     => "trial",
            Self::Inactive  => "inactive",
        }
    }

    /// Cancelled rows are excluded from every revenue figure.
    pub fn is_paying(&self) -> bool {
        *self != Self::Cancelled
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Legacy databases store Portuguese labels.
        match s.trim().to_ascii_lowercase().as_str() {
            "active" | "ativo"                     => Ok(Self::Active),
            "cancelled" | "canceled" | "cancelado" => Ok(Self::Cancelled),
            "trial"                                => Ok(Self::Trial),
            "inactive" | "inativo"                 => Ok(Self::Inactive),
            other => Err(format!(
                "unknown status '{other}', expected one of active, cancelled, trial, inactive"
            )),
        }
    }
}

// ── Raw row ──────────────────────────────────────────────────────────────────

/// One row of `vw_subscription_details`, before validation.
///
/// Every column is optional so that a missing value surfaces as a
/// `MalformedInput` error instead of a driver failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRow {
    pub subscription_id:   Option<i64>,
    pub company_id:        Option<i64>,
    pub company_name:      Option<String>,
    pub tax_id:            Option<String>,
    pub plan_name:         Option<String>,
    pub status:            Option<String>,
    pub start_date:        Option<String>,
    pub next_billing_date: Option<String>,
    pub monthly_price:     Option<f64>,
}

// ── Validated record ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id:                SubscriptionId,
    pub company_id:        Option<CompanyId>,
    pub company_name:      String,
    pub plan_name:         String,
    pub status:            SubscriptionStatus,
    pub start_date:        NaiveDate,
    pub next_billing_date: Option<NaiveDate>,
    pub monthly_price:     f64,
}

impl SubscriptionRecord {
    /// Validate a raw row. A `start_date` after `today` is accepted with a
    /// warning; tenure clamps it to zero downstream.
    pub fn from_row(row: &SubscriptionRow, today: NaiveDate) -> MetricsResult<Self> {
        let id = row
            .subscription_id
            .ok_or_else(|| MetricsError::malformed(None, "subscription_id", "is missing"))?;
        let row_id = Some(id);
        if id <= 0 {
            return Err(MetricsError::malformed(row_id, "subscription_id", format!("must be positive, got {id}")));
        }

        let company_name = required_text(row.company_name.as_deref(), row_id, "company_name")?;
        let plan_name = required_text(row.plan_name.as_deref(), row_id, "plan_name")?;

        let status_raw = required_text(row.status.as_deref(), row_id, "status")?;
        let status = status_raw
            .parse::<SubscriptionStatus>()
            .map_err(|e| MetricsError::malformed(row_id, "status", e))?;

        let start_raw = required_text(row.start_date.as_deref(), row_id, "start_date")?;
        let start_date = parse_date(&start_raw, row_id, "start_date")?;
        if start_date > today {
            log::warn!("subscription: row {id} starts {start_date}, after {today}");
        }

        let next_billing_date = match row.next_billing_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_date(raw, row_id, "next_billing_date")?),
        };

        let monthly_price = row
            .monthly_price
            .ok_or_else(|| MetricsError::malformed(row_id, "monthly_price", "is missing"))?;
        if !monthly_price.is_finite() || monthly_price <= 0.0 {
            return Err(MetricsError::malformed(
                row_id,
                "monthly_price",
                format!("must be a positive amount, got {monthly_price}"),
            ));
        }

        Ok(Self {
            id,
            company_id: row.company_id,
            company_name,
            plan_name,
            status,
            start_date,
            next_billing_date,
            monthly_price,
        })
    }

    /// Validate every row, failing on the first malformed one.
    pub fn from_rows(rows: &[SubscriptionRow], today: NaiveDate) -> MetricsResult<Vec<Self>> {
        rows.iter().map(|r| Self::from_row(r, today)).collect()
    }
}

fn required_text(value: Option<&str>, row_id: Option<i64>, field: &'static str) -> MetricsResult<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        Some(_) => Err(MetricsError::malformed(row_id, field, "is empty")),
        None    => Err(MetricsError::malformed(row_id, field, "is missing")),
    }
}

/// SQLite hands dates back as text; accept a bare date or a timestamp whose
/// time part follows a space or `T`.
fn parse_date(raw: &str, row_id: Option<i64>, field: &'static str) -> MetricsResult<NaiveDate> {
    let (date_part, rest) = match raw.get(..10) {
        Some(date) => (date, &raw[10..]),
        None => (raw, ""),
    };
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T')) {
        return Err(MetricsError::malformed(
            row_id,
            field,
            format!("'{raw}' has trailing text after the date"),
        ));
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| MetricsError::malformed(row_id, field, format!("'{raw}' is not a date: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn valid_row() -> SubscriptionRow {
        SubscriptionRow {
            subscription_id:   Some(7),
            company_id:        Some(3),
            company_name:      Some("Cloud Analytics 12".into()),
            tax_id:            None,
            plan_name:         Some("Pro".into()),
            status:            Some("Active".into()),
            start_date:        Some("2025-01-15".into()),
            next_billing_date: Some("2025-02-14 00:00:00".into()),
            monthly_price:     Some(199.90),
        }
    }

    #[test]
    fn valid_row_parses() {
        let rec = SubscriptionRecord::from_row(&valid_row(), today()).unwrap();
        assert_eq!(rec.status, SubscriptionStatus::Active);
        assert_eq!(rec.next_billing_date, NaiveDate::from_ymd_opt(2025, 2, 14));
    }

    #[test]
    fn missing_price_is_malformed() {
        let row = SubscriptionRow { monthly_price: None, ..valid_row() };
        let err = SubscriptionRecord::from_row(&row, today()).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedInput { field: "monthly_price", row_id: Some(7), .. }));
    }

    #[test]
    fn negative_price_is_malformed() {
        let row = SubscriptionRow { monthly_price: Some(-5.0), ..valid_row() };
        assert!(SubscriptionRecord::from_row(&row, today()).unwrap_err().is_malformed_input());
    }

    #[test]
    fn unknown_status_is_malformed() {
        let row = SubscriptionRow { status: Some("paused".into()), ..valid_row() };
        let err = SubscriptionRecord::from_row(&row, today()).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedInput { field: "status", .. }));
    }

    #[test]
    fn future_start_date_is_accepted() {
        let row = SubscriptionRow { start_date: Some("2025-06-02".into()), ..valid_row() };
        let rec = SubscriptionRecord::from_row(&row, today()).unwrap();
        assert_eq!(rec.start_date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
    }

    #[test]
    fn timestamp_suffixes_are_accepted() {
        for raw in ["2025-01-15", "2025-01-15 08:30:00", "2025-01-15T08:30:00Z"] {
            let row = SubscriptionRow { start_date: Some(raw.into()), ..valid_row() };
            let rec = SubscriptionRecord::from_row(&row, today()).unwrap();
            assert_eq!(rec.start_date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(), "{raw}");
        }
    }

    #[test]
    fn trailing_garbage_after_date_is_malformed() {
        let row = SubscriptionRow { start_date: Some("2025-01-15garbage".into()), ..valid_row() };
        let err = SubscriptionRecord::from_row(&row, today()).unwrap_err();
        assert!(matches!(err, MetricsError::MalformedInput { field: "start_date", .. }), "{err:?}");
    }

    #[test]
    fn blank_next_billing_is_none() {
        let row = SubscriptionRow { next_billing_date: Some("  ".into()), ..valid_row() };
        let rec = SubscriptionRecord::from_row(&row, today()).unwrap();
        assert_eq!(rec.next_billing_date, None);
    }

    #[test]
    fn legacy_labels_parse() {
        assert_eq!("Cancelado".parse::<SubscriptionStatus>(), Ok(SubscriptionStatus::Cancelled));
        assert_eq!("ATIVO".parse::<SubscriptionStatus>(), Ok(SubscriptionStatus::Active));
        assert_eq!("Inativo".parse::<SubscriptionStatus>(), Ok(SubscriptionStatus::Inactive));
    }
}
