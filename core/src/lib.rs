//! Subscription analytics core: KPI calculation, threshold alerts and the
//! SQLite-backed extract → transform → load pipeline around them.
//!
//! The calculator (`kpi`) and evaluator (`alerts`) are pure. Everything that
//! touches the outside world (store, pipeline, export, seed) takes its
//! dependencies as explicit arguments.

pub mod alerts;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod kpi;
pub mod name_generator;
pub mod pagination;
pub mod pipeline;
pub mod rng;
pub mod seed;
pub mod source;
pub mod store;
pub mod subscription;
pub mod types;

pub use alerts::{evaluate, Alert, AlertKind, AlertSeverity};
pub use config::{AlertThresholds, DashboardConfig};
pub use error::{MetricsError, MetricsResult};
pub use kpi::{compute_ltv, compute_metrics, mrr_growth, revenue_by_plan, AggregateMetrics, EnrichedSubscription};
pub use subscription::{SubscriptionRecord, SubscriptionRow, SubscriptionStatus};
