//! Fixture data generator: plans, companies, contacts and subscriptions.
//!
//! Output is fully determined by `SeedOptions`: the same RNG seed and
//! reference date always produce the same rows.

use crate::{
    error::{MetricsError, MetricsResult},
    name_generator::NameGenerator,
    rng::{SeedRng, SeedStream},
    store::{DashboardStore, NewSubscription, PlanRow},
    subscription::SubscriptionStatus,
};
use chrono::{Duration, NaiveDate};

/// Status mix of generated subscriptions, in `SubscriptionStatus::ALL` order.
pub const STATUS_WEIGHTS: [f64; 4] = [70.0, 10.0, 15.0, 5.0];

/// Days between a subscription's start and its first renewal.
pub const BILLING_CYCLE_DAYS: i64 = 30;

#[derive(Debug, Clone)]
pub struct SeedOptions {
    pub companies:      usize,
    pub rng_seed:       u64,
    /// Oldest generated start date, in days before `reference_date`.
    pub max_age_days:   i64,
    pub reference_date: NaiveDate,
}

impl SeedOptions {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { companies: 100, rng_seed: 42, max_age_days: 730, reference_date }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub plans:         usize,
    pub companies:     usize,
    pub users:         usize,
    pub subscriptions: usize,
}

pub fn default_plans() -> Vec<PlanRow> {
    vec![
        PlanRow { plan_id: 1, name: "Basic".into(),      monthly_price: 99.90,  user_limit: 3,   storage_limit_gb: 50.0 },
        PlanRow { plan_id: 2, name: "Pro".into(),        monthly_price: 199.90, user_limit: 10,  storage_limit_gb: 500.0 },
        PlanRow { plan_id: 3, name: "Enterprise".into(), monthly_price: 499.90, user_limit: 999, storage_limit_gb: 5000.0 },
    ]
}

/// Populate `store` in a single transaction. Nothing is written on failure.
pub fn seed_database(store: &DashboardStore, options: &SeedOptions) -> MetricsResult<SeedSummary> {
    if options.max_age_days < 1 {
        return Err(MetricsError::InvalidConfig(format!(
            "max_age_days must be at least 1, got {}", options.max_age_days
        )));
    }

    let plans = default_plans();
    let mut company_rng = SeedRng::new(options.rng_seed, SeedStream::Companies);
    let mut user_rng = SeedRng::new(options.rng_seed, SeedStream::Users);
    let mut sub_rng = SeedRng::new(options.rng_seed, SeedStream::Subscriptions);
    log::debug!(
        "seed: streams {}, {}, {} from rng_seed={}",
        SeedStream::Companies.name(),
        SeedStream::Users.name(),
        SeedStream::Subscriptions.name(),
        options.rng_seed,
    );

    let summary = store.with_transaction(|tx| {
        for plan in &plans {
            tx.insert_plan(plan)?;
        }

        let mut summary = SeedSummary { plans: plans.len(), companies: 0, users: 0, subscriptions: 0 };

        for _ in 0..options.companies {
            let days_ago = company_rng.range_inclusive(1, options.max_age_days);
            let created_on = options.reference_date - Duration::days(days_ago);
            let legal_name = NameGenerator::generate_company_name(&mut company_rng);
            let tax_id = NameGenerator::generate_tax_id(&mut company_rng);
            let company_id = tx.insert_company(&legal_name, Some(&tax_id), &created_on.to_string())?;
            summary.companies += 1;

            let person = NameGenerator::generate_person_name(&mut user_rng);
            let email = NameGenerator::contact_email(&person, company_id);
            tx.insert_user(&person, &email, "admin", company_id)?;
            summary.users += 1;

            let status = SubscriptionStatus::ALL[sub_rng.weighted_index(&STATUS_WEIGHTS)];
            let plan = sub_rng.pick(&plans);
            let renewal = created_on + Duration::days(BILLING_CYCLE_DAYS);
            tx.insert_subscription(&NewSubscription {
                status:            status.as_str().to_string(),
                start_date:        created_on.to_string(),
                renewal_date:      Some(renewal.to_string()),
                next_billing_date: Some(renewal.to_string()),
                company_id,
                plan_id:           plan.plan_id,
            })?;
            summary.subscriptions += 1;
        }

        Ok(summary)
    })?;

    log::info!(
        "seed: {} companies, {} users, {} subscriptions (rng_seed={})",
        summary.companies,
        summary.users,
        summary.subscriptions,
        options.rng_seed,
    );
    Ok(summary)
}
