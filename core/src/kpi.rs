//! KPI calculator: MRR, ARR, churn, LTV and the per-row tenure fields.
//!
//! Every function here is pure: inputs are borrowed, outputs are new values,
//! and degenerate input (no rows, zero denominators) resolves to zero or an
//! empty collection rather than an error.
//!
//! Cancelled subscriptions never count towards revenue (MRR, ARR,
//! revenue-by-plan, growth) but always count as customers, so churn has the
//! full population as its denominator.

use crate::{
    subscription::{SubscriptionRecord, SubscriptionStatus},
    types::{round_money, round_rate, DAYS_PER_MONTH},
};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Public types ─────────────────────────────────────────────────────────────

/// A record plus the fields derived from it at a reference date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSubscription {
    #[serde(flatten)]
    pub record:        SubscriptionRecord,
    pub tenure_days:   u32,
    pub estimated_ltv: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub mrr:                 f64,
    pub arr:                 f64,
    pub total_customers:     usize,
    pub active_customers:    usize,
    pub trial_customers:     usize,
    pub cancelled_customers: usize,
    pub churn_rate:          f64,
    pub average_ltv:         f64,
    pub average_ticket:      f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CohortPeriod {
    Monthly,
    Quarterly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortSummary {
    /// `YYYY-MM` for monthly cohorts, `YYYY-Qn` for quarterly ones.
    pub cohort:         String,
    pub new_customers:  usize,
    pub cohort_revenue: f64,
    pub average_ltv:    f64,
}

/// Anything that carries a subscription record.
pub trait AsRecord {
    fn record(&self) -> &SubscriptionRecord;
}

impl AsRecord for SubscriptionRecord {
    fn record(&self) -> &SubscriptionRecord { self }
}

impl AsRecord for EnrichedSubscription {
    fn record(&self) -> &SubscriptionRecord { &self.record }
}

// ── Per-row fields ───────────────────────────────────────────────────────────

/// Days from `start` to `reference`, clamped at zero for future-dated rows.
pub fn tenure_days(start: NaiveDate, reference: NaiveDate) -> u32 {
    let days = reference.signed_duration_since(start).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

/// Lifetime value accrued so far on a 30-day month.
pub fn estimated_ltv(monthly_price: f64, tenure_days: u32) -> f64 {
    round_money(monthly_price * (tenure_days as f64 / DAYS_PER_MONTH))
}

/// Derive `tenure_days` and `estimated_ltv` for every row at `reference`.
pub fn compute_ltv<R: AsRecord>(rows: &[R], reference: NaiveDate) -> Vec<EnrichedSubscription> {
    let enriched: Vec<EnrichedSubscription> = rows
        .iter()
        .map(|r| {
            let record = r.record().clone();
            let tenure = tenure_days(record.start_date, reference);
            let ltv = estimated_ltv(record.monthly_price, tenure);
            EnrichedSubscription { record, tenure_days: tenure, estimated_ltv: ltv }
        })
        .collect();

    log::debug!("kpi: ltv computed for {} rows at {reference}", enriched.len());
    enriched
}

/// `compute_ltv` against the local calendar date.
pub fn compute_ltv_today<R: AsRecord>(rows: &[R]) -> Vec<EnrichedSubscription> {
    compute_ltv(rows, Local::now().date_naive())
}

// ── Aggregates ───────────────────────────────────────────────────────────────

/// Unrounded MRR: summed price of every non-cancelled row.
fn raw_mrr<R: AsRecord>(rows: &[R]) -> f64 {
    rows.iter()
        .map(AsRecord::record)
        .filter(|r| r.status.is_paying())
        .map(|r| r.monthly_price)
        .sum()
}

fn count_status<R: AsRecord>(rows: &[R], status: SubscriptionStatus) -> usize {
    rows.iter().filter(|r| r.record().status == status).count()
}

pub fn compute_metrics(rows: &[EnrichedSubscription]) -> AggregateMetrics {
    if rows.is_empty() {
        return AggregateMetrics::default();
    }

    let total = rows.len();
    let n = total as f64;
    let mrr = raw_mrr(rows);
    let cancelled = count_status(rows, SubscriptionStatus::Cancelled);

    let metrics = AggregateMetrics {
        mrr:                 round_money(mrr),
        arr:                 round_money(mrr * 12.0),
        total_customers:     total,
        active_customers:    count_status(rows, SubscriptionStatus::Active),
        trial_customers:     count_status(rows, SubscriptionStatus::Trial),
        cancelled_customers: cancelled,
        churn_rate:          round_rate(cancelled as f64 / n),
        average_ltv:         round_money(rows.iter().map(|r| r.estimated_ltv).sum::<f64>() / n),
        average_ticket:      round_money(rows.iter().map(|r| r.record.monthly_price).sum::<f64>() / n),
    };

    log::debug!(
        "kpi: metrics over {total} rows: mrr={:.2} churn={:.4}",
        metrics.mrr,
        metrics.churn_rate,
    );
    metrics
}

/// Summed monthly price per plan, cancelled rows excluded.
pub fn revenue_by_plan<R: AsRecord>(rows: &[R]) -> BTreeMap<String, f64> {
    let mut by_plan: BTreeMap<String, f64> = BTreeMap::new();
    for r in rows.iter().map(AsRecord::record).filter(|r| r.status.is_paying()) {
        *by_plan.entry(r.plan_name.clone()).or_insert(0.0) += r.monthly_price;
    }
    by_plan
}

/// Relative MRR change between two periods, rounded to 4 places.
///
/// Returns `0.0` when the previous period had no MRR. That is a policy, not a
/// growth rate: callers must not read a zero here as "flat".
pub fn mrr_growth<A: AsRecord, B: AsRecord>(current: &[A], previous: &[B]) -> f64 {
    let prev = raw_mrr(previous);
    if prev == 0.0 {
        return 0.0;
    }
    round_rate((raw_mrr(current) - prev) / prev)
}

/// Row counts per status. Statuses with no rows are omitted.
pub fn status_distribution<R: AsRecord>(rows: &[R]) -> BTreeMap<SubscriptionStatus, usize> {
    let mut counts = BTreeMap::new();
    for r in rows {
        *counts.entry(r.record().status).or_insert(0) += 1;
    }
    counts
}

fn cohort_label(date: NaiveDate, period: CohortPeriod) -> String {
    match period {
        CohortPeriod::Monthly   => format!("{:04}-{:02}", date.year(), date.month()),
        CohortPeriod::Quarterly => format!("{:04}-Q{}", date.year(), (date.month0() / 3) + 1),
    }
}

/// Group rows by the period their subscription started in.
pub fn cohort_breakdown(rows: &[EnrichedSubscription], period: CohortPeriod) -> Vec<CohortSummary> {
    // (count, revenue, ltv sum)
    let mut groups: BTreeMap<String, (usize, f64, f64)> = BTreeMap::new();
    for r in rows {
        let entry = groups
            .entry(cohort_label(r.record.start_date, period))
            .or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += r.record.monthly_price;
        entry.2 += r.estimated_ltv;
    }

    groups
        .into_iter()
        .map(|(cohort, (count, revenue, ltv_sum))| CohortSummary {
            cohort,
            new_customers:  count,
            cohort_revenue: round_money(revenue),
            average_ltv:    round_money(ltv_sum / count as f64),
        })
        .collect()
}
