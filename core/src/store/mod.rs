//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The pipeline and the seed call store methods; they never execute SQL
//! directly. A store owns exactly one connection, released on drop.

use crate::error::MetricsResult;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;

mod company;
mod snapshot;
mod subscription;

pub use snapshot::KpiSnapshotRow;

pub struct DashboardStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl DashboardStore {
    /// Open (or create) the dashboard database at `path`, waiting up to
    /// `busy_timeout` on a locked file.
    pub fn open_with_timeout(path: &str, busy_timeout: Duration) -> MetricsResult<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() && !path.starts_with("file:") {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        conn.busy_timeout(busy_timeout)?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        log::debug!("store: opened {path}");
        Ok(Self { conn, path: Some(path.to_string()) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> MetricsResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> MetricsResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_schema.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_kpi_snapshot.sql"))?;
        Ok(())
    }

    /// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
    pub fn with_transaction<T, F>(&self, f: F) -> MetricsResult<T>
    where
        F: FnOnce(&Self) -> MetricsResult<T>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT;")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.conn.execute_batch("ROLLBACK;") {
                    log::error!("store: rollback failed: {rollback_err}");
                } else {
                    log::warn!("store: transaction rolled back: {e}");
                }
                Err(e)
            }
        }
    }
}

// ── Row types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRow {
    pub plan_id:          i64,
    pub name:             String,
    pub monthly_price:    f64,
    pub user_limit:       i64,
    pub storage_limit_gb: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub status:            String,
    pub start_date:        String,
    pub renewal_date:      Option<String>,
    pub next_billing_date: Option<String>,
    pub company_id:        i64,
    pub plan_id:           i64,
}
