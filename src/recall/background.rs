//! Background recall trigger: daily scan on a dedicated thread.
//!
//! Wakes every `check_interval_secs` and runs a scan at most once per UTC
//! day, from `scan_hour_utc` onwards. Re-running is harmless since the scan
//! is idempotent.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Timelike, Utc};

use super::error::RecallError;
use super::scanner::{run_scan, RecallScanner};
use super::store::SqlitePatientStore;
use super::types::RecallConfig;
use crate::db::open_database;

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY_SECS: u64 = 5;

/// Handle for the background recall thread. Dropping it stops and joins the thread.
pub struct RecallSchedulerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl RecallSchedulerHandle {
    /// Request shutdown. A scan already running completes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for RecallSchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

pub fn start_recall_scheduler(db_path: PathBuf, config: RecallConfig) -> RecallSchedulerHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();

    let handle = std::thread::spawn(move || {
        tracing::info!(
            interval_secs = config.check_interval_secs,
            scan_hour = config.scan_hour_utc,
            "Background recall scheduler started"
        );
        scheduler_loop(&db_path, &config, &flag);
    });

    RecallSchedulerHandle {
        shutdown,
        handle: Some(handle),
    }
}

fn scheduler_loop(db_path: &Path, config: &RecallConfig, shutdown: &AtomicBool) {
    let mut last_run: Option<NaiveDate> = None;
    let ticks = (config.check_interval_secs / SLEEP_GRANULARITY_SECS).max(1);

    while !shutdown.load(Ordering::Relaxed) {
        for _ in 0..ticks {
            if shutdown.load(Ordering::Relaxed) {
                tracing::info!("Background recall scheduler shutting down");
                return;
            }
            std::thread::sleep(Duration::from_secs(SLEEP_GRANULARITY_SECS));
        }

        let now = Utc::now();
        if !should_run(now, last_run, config.scan_hour_utc) {
            continue;
        }

        match run_daily_scan(db_path, config, now) {
            Ok(count) => {
                tracing::info!("Generated {count} recall alerts");
                last_run = Some(now.date_naive());
            }
            Err(e) => tracing::error!(error = %e, "Scheduled recall scan failed"),
        }
    }
    tracing::info!("Background recall scheduler shutting down");
}

/// Due when the scan hour has been reached and today has not been scanned yet.
pub fn should_run(now: DateTime<Utc>, last_run: Option<NaiveDate>, scan_hour: u32) -> bool {
    now.hour() >= scan_hour && last_run != Some(now.date_naive())
}

fn run_daily_scan(
    db_path: &Path,
    config: &RecallConfig,
    now: DateTime<Utc>,
) -> Result<usize, RecallError> {
    let conn = open_database(db_path)?;
    let scanner = RecallScanner::new(config.clone());
    let report = run_scan(&conn, &SqlitePatientStore::new(), &scanner, now)?;
    let count = report.alerts.len();
    report.into_result()?;
    Ok(count)
}
