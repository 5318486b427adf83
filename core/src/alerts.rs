//! Alert evaluator: threshold checks over a subscription row set.
//!
//! `evaluate` runs four independent checks, always all of them, in a fixed
//! order: churn, revenue, LTV, trial saturation. Each appends at most one
//! alert, so the output order is the check order. Nothing is remembered
//! between calls.

use crate::{
    config::AlertThresholds,
    kpi::EnrichedSubscription,
    subscription::SubscriptionStatus,
};
use serde::{Deserialize, Serialize};

/// Churn above this fraction of `max_churn` raises a warning.
pub const CHURN_WARNING_RATIO: f64 = 0.8;
/// Revenue deficit (fraction of goal) above which a miss is critical.
pub const REVENUE_CRITICAL_DEFICIT: f64 = 0.20;
/// MRR at or above goal × this factor raises an informational alert.
pub const REVENUE_SURPLUS_FACTOR: f64 = 1.2;
/// Trial share of the customer base that signals a conversion problem.
pub const TRIAL_SATURATION_SHARE: f64 = 0.15;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// Which check produced an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Churn,
    Revenue,
    Ltv,
    TrialSaturation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub severity:      AlertSeverity,
    pub kind:          AlertKind,
    pub title:         String,
    pub message:       String,
    pub current_value: f64,
    pub threshold:     f64,
}

// ── Evaluation ───────────────────────────────────────────────────────────────

/// Run every check against `rows`. An empty row set yields no alerts.
pub fn evaluate(rows: &[EnrichedSubscription], thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();
    if rows.is_empty() {
        return alerts;
    }

    alerts.extend(check_churn(rows, thresholds.max_churn));
    alerts.extend(check_revenue(rows, thresholds.revenue_goal));
    alerts.extend(check_ltv(rows, thresholds.min_ltv));
    alerts.extend(check_trial_saturation(rows));

    log::debug!("alerts: {} raised over {} rows", alerts.len(), rows.len());
    alerts
}

fn count_status(rows: &[EnrichedSubscription], status: SubscriptionStatus) -> usize {
    rows.iter().filter(|r| r.record.status == status).count()
}

fn check_churn(rows: &[EnrichedSubscription], max_churn: f64) -> Option<Alert> {
    let cancelled = count_status(rows, SubscriptionStatus::Cancelled);
    let churn_rate = cancelled as f64 / rows.len() as f64;

    if churn_rate > max_churn {
        Some(Alert {
            severity: AlertSeverity::Critical,
            kind: AlertKind::Churn,
            title: "Critical Churn Rate".into(),
            message: format!(
                "Churn of {} is above the {} limit. {cancelled} customers cancelled.",
                percent(churn_rate),
                percent(max_churn),
            ),
            current_value: churn_rate,
            threshold: max_churn,
        })
    } else if churn_rate > max_churn * CHURN_WARNING_RATIO {
        Some(Alert {
            severity: AlertSeverity::Warning,
            kind: AlertKind::Churn,
            title: "Churn Approaching Limit".into(),
            message: format!(
                "Churn rate ({}) is approaching the {} limit. {cancelled} customers cancelled.",
                percent(churn_rate),
                percent(max_churn),
            ),
            current_value: churn_rate,
            threshold: max_churn,
        })
    } else {
        None
    }
}

fn check_revenue(rows: &[EnrichedSubscription], goal: f64) -> Option<Alert> {
    let mrr: f64 = rows
        .iter()
        .filter(|r| r.record.status.is_paying())
        .map(|r| r.record.monthly_price)
        .sum();

    if mrr < goal {
        let deficit = goal - mrr;
        let (severity, title) = if deficit / goal > REVENUE_CRITICAL_DEFICIT {
            (AlertSeverity::Critical, "Revenue Goal Critical")
        } else {
            (AlertSeverity::Warning, "Revenue Goal Missed")
        };
        Some(Alert {
            severity,
            kind: AlertKind::Revenue,
            title: title.into(),
            message: format!(
                "MRR ({}) is {} below the goal ({}).",
                money(mrr),
                money(deficit),
                money(goal),
            ),
            current_value: mrr,
            threshold: goal,
        })
    } else if mrr >= goal * REVENUE_SURPLUS_FACTOR {
        let surplus = mrr - goal;
        Some(Alert {
            severity: AlertSeverity::Info,
            kind: AlertKind::Revenue,
            title: "Revenue Goal Exceeded".into(),
            message: format!(
                "MRR ({}) is {:.1}% above the goal ({}), a surplus of {}.",
                money(mrr),
                (mrr / goal - 1.0) * 100.0,
                money(goal),
                money(surplus),
            ),
            current_value: mrr,
            threshold: goal,
        })
    } else {
        None
    }
}

fn check_ltv(rows: &[EnrichedSubscription], min_ltv: f64) -> Option<Alert> {
    let average = rows.iter().map(|r| r.estimated_ltv).sum::<f64>() / rows.len() as f64;
    if average >= min_ltv {
        return None;
    }

    let below = rows.iter().filter(|r| r.estimated_ltv < min_ltv).count();
    Some(Alert {
        severity: AlertSeverity::Warning,
        kind: AlertKind::Ltv,
        title: "Average LTV Below Target".into(),
        message: format!(
            "Average LTV ({}) is below the target ({}). {below} customers below target.",
            money(average),
            money(min_ltv),
        ),
        current_value: average,
        threshold: min_ltv,
    })
}

fn check_trial_saturation(rows: &[EnrichedSubscription]) -> Option<Alert> {
    let total = rows.len();
    let trials = count_status(rows, SubscriptionStatus::Trial);
    let share = trials as f64 / total as f64;
    if share <= TRIAL_SATURATION_SHARE {
        return None;
    }

    Some(Alert {
        severity: AlertSeverity::Warning,
        kind: AlertKind::TrialSaturation,
        title: "High Number of Trial Customers".into(),
        message: format!(
            "{trials} customers ({}) are still on trial. Consider conversion campaigns.",
            percent(share),
        ),
        current_value: trials as f64,
        threshold: total as f64 * TRIAL_SATURATION_SHARE,
    })
}

// ── Helpers ──────────────────────────────────────────────────────────────────

pub fn alerts_with_severity(alerts: &[Alert], severity: AlertSeverity) -> Vec<&Alert> {
    alerts.iter().filter(|a| a.severity == severity).collect()
}

pub fn has_critical(alerts: &[Alert]) -> bool {
    alerts.iter().any(|a| a.severity == AlertSeverity::Critical)
}

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

/// `$1,234,567.89`
pub fn money(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::money;

    #[test]
    fn money_groups_thousands() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(999.5), "$999.50");
        assert_eq!(money(72_000.0), "$72,000.00");
        assert_eq!(money(1_234_567.891), "$1,234,567.89");
        assert_eq!(money(-1500.0), "-$1,500.00");
    }
}
