//! Alert evaluator tests: one scenario per check, plus ordering.

use chrono::{Duration, NaiveDate};
use saas_metrics_core::{
    alerts::{alerts_with_severity, evaluate, has_critical, AlertKind, AlertSeverity},
    config::AlertThresholds,
    kpi::{compute_ltv, EnrichedSubscription},
    subscription::{SubscriptionRecord, SubscriptionStatus},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

/// `active` + `trial` + `cancelled` rows, all at `price`, started `days_ago`.
fn book(active: usize, trial: usize, cancelled: usize, price: f64, days_ago: i64) -> Vec<EnrichedSubscription> {
    let statuses = std::iter::repeat(SubscriptionStatus::Active)
        .take(active)
        .chain(std::iter::repeat(SubscriptionStatus::Trial).take(trial))
        .chain(std::iter::repeat(SubscriptionStatus::Cancelled).take(cancelled));

    let records: Vec<SubscriptionRecord> = statuses
        .enumerate()
        .map(|(i, status)| SubscriptionRecord {
            id: i as i64 + 1,
            company_id: Some(i as i64 + 1),
            company_name: format!("Company {}", i + 1),
            plan_name: "Pro".into(),
            status,
            start_date: reference() - Duration::days(days_ago),
            next_billing_date: None,
            monthly_price: price,
        })
        .collect();
    compute_ltv(&records, reference())
}

fn thresholds(max_churn: f64, revenue_goal: f64, min_ltv: f64) -> AlertThresholds {
    AlertThresholds { max_churn, revenue_goal, min_ltv }
}

// ── Churn ────────────────────────────────────────────────────────────────────

/// 6% churn against a 5% limit is critical.
#[test]
fn churn_above_limit_is_critical() {
    // MRR 9,400 sits between the 9,000 goal and 1.2 × goal; LTV 200 clears 1.0.
    let rows = book(94, 0, 6, 100.0, 60);
    let alerts = evaluate(&rows, &thresholds(0.05, 9_000.0, 1.0));

    assert_eq!(alerts.len(), 1, "only the churn check should fire: {alerts:?}");
    assert_eq!(alerts[0].kind, AlertKind::Churn);
    assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    assert_eq!(alerts[0].title, "Critical Churn Rate");
    assert!((alerts[0].current_value - 0.06).abs() < 1e-9);
}

/// 4.5% churn is above 80% of the 5% limit, so it warns.
#[test]
fn churn_near_limit_is_warning() {
    let rows = book(191, 0, 9, 100.0, 60);
    let alerts = evaluate(&rows, &thresholds(0.05, 18_000.0, 1.0));

    assert_eq!(alerts.len(), 1, "only the churn check should fire: {alerts:?}");
    assert_eq!(alerts[0].kind, AlertKind::Churn);
    assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    assert_eq!(alerts[0].title, "Churn Approaching Limit");
}

/// 3% churn is comfortably inside the limit.
#[test]
fn low_churn_raises_nothing() {
    let rows = book(97, 0, 3, 100.0, 60);
    let alerts = evaluate(&rows, &thresholds(0.05, 9_000.0, 1.0));
    assert!(alerts.is_empty(), "expected no alerts, got {alerts:?}");
}

// ── Revenue ──────────────────────────────────────────────────────────────────

/// MRR of exactly 1.2 × goal is reported as a surplus.
#[test]
fn revenue_at_surplus_factor_is_info() {
    let rows = book(720, 0, 0, 100.0, 60);
    let alerts = evaluate(&rows, &thresholds(0.05, 60_000.0, 1.0));

    assert_eq!(alerts.len(), 1, "only the revenue check should fire: {alerts:?}");
    let alert = &alerts[0];
    assert_eq!(alert.kind, AlertKind::Revenue);
    assert_eq!(alert.severity, AlertSeverity::Info);
    assert_eq!(alert.title, "Revenue Goal Exceeded");
    assert_eq!(alert.current_value, 72_000.0);
    assert_eq!(alert.threshold, 60_000.0);
    assert!(alert.message.contains("$72,000.00"), "message: {}", alert.message);
    assert!(alert.message.contains("$12,000.00"), "surplus missing: {}", alert.message);
}

/// A one-third shortfall is critical; an 8% shortfall is only a warning.
#[test]
fn revenue_shortfall_severity_depends_on_deficit() {
    let t = thresholds(0.05, 60_000.0, 1.0);

    let critical = evaluate(&book(400, 0, 0, 100.0, 60), &t);
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].severity, AlertSeverity::Critical);
    assert_eq!(critical[0].title, "Revenue Goal Critical");

    let warning = evaluate(&book(550, 0, 0, 100.0, 60), &t);
    assert_eq!(warning.len(), 1);
    assert_eq!(warning[0].severity, AlertSeverity::Warning);
    assert_eq!(warning[0].title, "Revenue Goal Missed");
}

// ── LTV & trials ─────────────────────────────────────────────────────────────

/// Brand-new subscriptions have zero LTV, below any positive target.
#[test]
fn low_average_ltv_warns() {
    let rows = book(100, 0, 0, 100.0, 0);
    let alerts = evaluate(&rows, &thresholds(0.05, 9_000.0, 1_000.0));

    assert_eq!(alerts.len(), 1, "only the LTV check should fire: {alerts:?}");
    assert_eq!(alerts[0].kind, AlertKind::Ltv);
    assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    assert_eq!(alerts[0].current_value, 0.0);
    assert!(alerts[0].message.contains("100 customers below target"), "message: {}", alerts[0].message);
}

/// Alert values carry the unrounded figure; only the message is formatted.
#[test]
fn ltv_alert_reports_unrounded_average() {
    let mut rows = book(3, 0, 0, 100.0, 60);
    rows[0].estimated_ltv = 1.0;
    rows[1].estimated_ltv = 2.0;
    rows[2].estimated_ltv = 2.0;
    let alerts = evaluate(&rows, &thresholds(0.05, 250.0, 1_000.0));

    let ltv = alerts.iter().find(|a| a.kind == AlertKind::Ltv).expect("LTV alert should fire");
    assert_eq!(ltv.current_value, 5.0 / 3.0);
    assert!(ltv.message.contains("$1.67"), "message: {}", ltv.message);
}

/// 16% of customers on trial crosses the 15% saturation share; 15% does not.
#[test]
fn trial_share_above_fifteen_percent_warns() {
    let t = thresholds(0.05, 9_000.0, 1.0);

    let saturated = evaluate(&book(84, 16, 0, 100.0, 60), &t);
    assert_eq!(saturated.len(), 1, "only the trial check should fire: {saturated:?}");
    assert_eq!(saturated[0].kind, AlertKind::TrialSaturation);
    assert_eq!(saturated[0].current_value, 16.0);
    assert!((saturated[0].threshold - 15.0).abs() < 1e-9);

    let at_limit = evaluate(&book(85, 15, 0, 100.0, 60), &t);
    assert!(at_limit.is_empty(), "15% exactly should not fire: {at_limit:?}");
}

// ── Evaluation contract ──────────────────────────────────────────────────────

/// No rows, no alerts, whatever the thresholds say.
#[test]
fn empty_input_raises_nothing() {
    assert!(evaluate(&[], &AlertThresholds::default()).is_empty());
}

/// When every check fires, alerts come out churn, revenue, LTV, trial.
#[test]
fn alerts_follow_check_order() {
    let rows = book(70, 20, 10, 100.0, 0);
    let alerts = evaluate(&rows, &AlertThresholds::default());

    let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![AlertKind::Churn, AlertKind::Revenue, AlertKind::Ltv, AlertKind::TrialSaturation],
    );
    assert!(has_critical(&alerts));
    assert_eq!(alerts_with_severity(&alerts, AlertSeverity::Critical).len(), 2);
    assert_eq!(alerts_with_severity(&alerts, AlertSeverity::Warning).len(), 2);
}

/// Evaluation is stateless: repeated calls agree.
#[test]
fn evaluation_is_repeatable() {
    let rows = book(70, 20, 10, 100.0, 30);
    let t = AlertThresholds::default();
    assert_eq!(evaluate(&rows, &t), evaluate(&rows, &t));
}
