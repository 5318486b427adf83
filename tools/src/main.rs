//! saas-runner: headless runner for the subscription analytics pipeline.
//!
//! Usage:
//!   saas-runner --data-dir ./data                      run the pipeline, print a summary
//!   saas-runner --db run.db --seed 100                 populate fixture data first
//!   saas-runner --db run.db --ipc-mode                 serve dashboard state as JSON lines

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use saas_metrics_core::{
    alerts::{evaluate, Alert},
    config::DashboardConfig,
    export::{default_file_name, summary_report, write_export, ExportFormat, SummaryLine},
    filter::{available_plans, SubscriptionFilter},
    kpi::{
        cohort_breakdown, compute_metrics, revenue_by_plan, status_distribution, AggregateMetrics,
        CohortPeriod, CohortSummary, EnrichedSubscription,
    },
    pagination::{PageInfo, Paginator},
    pipeline::{extract, transform},
    seed::{seed_database, SeedOptions},
    store::DashboardStore,
    subscription::SubscriptionStatus,
};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState {
        #[serde(default)]
        filter: SubscriptionFilter,
        #[serde(default = "first_page")]
        page: usize,
    },
    Refresh,
    Export {
        #[serde(default)]
        path: Option<String>,
        #[serde(default = "default_format")]
        format: ExportFormat,
        #[serde(default)]
        filter: SubscriptionFilter,
    },
    Quit,
}

fn first_page() -> usize { 1 }
fn default_format() -> ExportFormat { ExportFormat::Csv }

#[derive(serde::Serialize)]
struct UiState {
    title: String,
    loaded_at: String,
    total_records: usize,
    filtered_records: usize,
    available_plans: BTreeSet<String>,
    metrics: AggregateMetrics,
    revenue_by_plan: BTreeMap<String, f64>,
    status_distribution: BTreeMap<SubscriptionStatus, usize>,
    cohorts: Vec<CohortSummary>,
    alerts: Vec<Alert>,
    summary: Vec<SummaryLine>,
    page: PageInfo,
    rows: Vec<EnrichedSubscription>,
}

/// Enriched rows kept between requests until the TTL lapses or a refresh.
struct RowCache {
    ttl: Duration,
    rows: Vec<EnrichedSubscription>,
    loaded: Option<(Instant, chrono::DateTime<Utc>)>,
}

impl RowCache {
    fn new(ttl: Duration) -> Self {
        Self { ttl, rows: Vec::new(), loaded: None }
    }

    fn invalidate(&mut self) {
        self.loaded = None;
    }

    fn rows(&mut self, store: &DashboardStore, config: &DashboardConfig) -> Result<&[EnrichedSubscription]> {
        let fresh = self.loaded.is_some_and(|(at, _)| at.elapsed() < self.ttl);
        if !fresh {
            let today = today();
            let extraction = extract(store, config.etl.validation, today)?;
            self.rows = transform(&extraction.records, today);
            self.loaded = Some((Instant::now(), Utc::now()));
            log::info!("runner: cache reloaded, {} rows", self.rows.len());
        }
        Ok(&self.rows)
    }

    fn loaded_at(&self) -> String {
        self.loaded.map(|(_, at)| at.to_rfc3339()).unwrap_or_default()
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");

    let mut config = DashboardConfig::load(data_dir)?;
    if let Some(db) = arg_value(&args, "--db") {
        config.database.path = db.to_string();
    }
    init_logging(&config.log.level);

    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let seed_companies = parse_arg(&args, "--seed", 0usize);
    let rng_seed = parse_arg(&args, "--rng-seed", 42u64);

    let store = DashboardStore::open_with_timeout(
        &config.database.path,
        Duration::from_secs(config.database.timeout_secs),
    )?;
    store.migrate()?;
    log::info!(
        "runner: environment={:?}, db={}",
        config.environment,
        store.path().unwrap_or(":memory:"),
    );

    if seed_companies > 0 {
        let options = SeedOptions { companies: seed_companies, rng_seed, ..SeedOptions::new(today()) };
        let summary = seed_database(&store, &options)?;
        if !ipc_mode {
            println!("Seeded {} companies and {} subscriptions.", summary.companies, summary.subscriptions);
        }
    }

    if ipc_mode {
        run_ipc_loop(&store, &config)?;
    } else {
        run_pipeline(&store, &config)?;
    }
    Ok(())
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn run_pipeline(store: &DashboardStore, config: &DashboardConfig) -> Result<()> {
    use saas_metrics_core::pipeline::EtlPipeline;

    println!("{}", config.dashboard.title);
    println!("  db:      {}", config.database.path);
    println!("  report:  {}", config.output.report_path);
    println!();

    let report = EtlPipeline::new(store, config).run(today())?;
    let m = &report.metrics;

    println!("=== KPI SUMMARY ===");
    println!("  run_id:         {}", report.run_id);
    println!("  rows:           {}", report.rows_extracted);
    println!("  skipped rows:   {}", report.skipped.len());
    println!("  MRR:            {:.2}", m.mrr);
    println!("  ARR:            {:.2}", m.arr);
    println!("  customers:      {} ({} active, {} trial, {} cancelled)",
        m.total_customers, m.active_customers, m.trial_customers, m.cancelled_customers);
    println!("  churn rate:     {:.2}%", m.churn_rate * 100.0);
    println!("  average LTV:    {:.2}", m.average_ltv);
    println!("  average ticket: {:.2}", m.average_ticket);

    println!();
    println!("=== REVENUE BY PLAN ===");
    if report.revenue_by_plan.is_empty() {
        println!("  (no paying subscriptions)");
    }
    for (plan, revenue) in &report.revenue_by_plan {
        println!("  {plan:<12} {revenue:>12.2}");
    }

    println!();
    println!("=== ALERTS ===");
    if report.alerts.is_empty() {
        println!("  (none)");
    }
    for alert in &report.alerts {
        println!("  [{:?}] {}: {}", alert.severity, alert.title, alert.message);
    }

    if let Some(path) = &report.report_path {
        println!();
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn run_ipc_loop(store: &DashboardStore, config: &DashboardConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut cache = RowCache::new(Duration::from_secs(config.etl.cache_ttl_secs));

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let reply = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Refresh => {
                cache.invalidate();
                build_ui_state(&mut cache, store, config, &SubscriptionFilter::default(), 1)
                    .and_then(|state| Ok(serde_json::to_value(state)?))
            }
            IpcCommand::GetState { filter, page } => {
                build_ui_state(&mut cache, store, config, &filter, page)
                    .and_then(|state| Ok(serde_json::to_value(state)?))
            }
            IpcCommand::Export { path, format, filter } => export_rows(&mut cache, store, config, path, format, &filter),
        };

        let reply = reply.unwrap_or_else(|e| {
            log::warn!("runner: request failed: {e:#}");
            serde_json::json!({ "error": e.to_string() })
        });
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }
    Ok(())
}

fn export_rows(
    cache: &mut RowCache,
    store: &DashboardStore,
    config: &DashboardConfig,
    path: Option<String>,
    format: ExportFormat,
    filter: &SubscriptionFilter,
) -> Result<serde_json::Value> {
    let rows = filter.apply(cache.rows(store, config)?);
    let path = path
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default_file_name(format, Local::now())));
    let written = write_export(&path, &rows, format)?;
    Ok(serde_json::json!({ "exported": rows.len(), "path": written }))
}

fn build_ui_state(
    cache: &mut RowCache,
    store: &DashboardStore,
    config: &DashboardConfig,
    filter: &SubscriptionFilter,
    page: usize,
) -> Result<UiState> {
    let all = cache.rows(store, config)?;
    let total_records = all.len();
    let plans = available_plans(all);
    let filtered = filter.apply(all);

    let paginator = Paginator::new(filtered.len(), config.dashboard.page_size);
    let page_rows = paginator.page(&filtered, page).to_vec();

    Ok(UiState {
        title: config.dashboard.title.clone(),
        loaded_at: cache.loaded_at(),
        total_records,
        filtered_records: filtered.len(),
        available_plans: plans,
        metrics: compute_metrics(&filtered),
        revenue_by_plan: revenue_by_plan(&filtered),
        status_distribution: status_distribution(&filtered),
        cohorts: cohort_breakdown(&filtered, CohortPeriod::Monthly),
        alerts: evaluate(&filtered, &config.thresholds),
        summary: summary_report(&filtered),
        page: paginator.page_info(page),
        rows: page_rows,
    })
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
