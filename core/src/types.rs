//! Shared primitive types used across the crate.

/// Primary key of a subscription row.
pub type SubscriptionId = i64;

/// Primary key of a customer company.
pub type CompanyId = i64;

/// Identifier of a single pipeline run (a v4 UUID string).
pub type RunId = String;

/// Nominal month length used by every tenure-based calculation.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Round to `places` decimal places, half away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Monetary rounding (2 places).
pub fn round_money(value: f64) -> f64 {
    round_to(value, 2)
}

/// Rate rounding (4 places).
pub fn round_rate(value: f64) -> f64 {
    round_to(value, 4)
}
