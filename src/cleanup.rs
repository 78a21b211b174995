//! Temp directory cleanup and retention sweeping.
//!
//! Every exit path removes the job directory: the worker on failure, the
//! download handler after the archive streams out, and the sweep here for
//! jobs nobody ever downloads.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::registry::JobRegistry;

/// Remove a job's temp directory. Missing directories are fine; anything
/// else is logged and swallowed, since cleanup must never fail the caller.
pub async fn remove_job_dir(dir: &Path) {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => info!(dir = %dir.display(), "removed job directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(dir = %dir.display(), error = %e, "could not remove job directory"),
    }
}

/// Periodically drop expired jobs and their directories.
///
/// Terminal jobs older than `retention_secs` are reaped; non-terminal jobs
/// are reaped at 4x retention as a safety net for a worker task that died
/// without recording a result.
pub fn spawn_retention_sweep(
    registry: JobRegistry,
    upload_root: PathBuf,
    retention_secs: u64,
) -> tokio::task::JoinHandle<()> {
    let interval = Duration::from_secs((retention_secs / 4).max(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            sweep_once(&registry, &upload_root, retention_secs).await;
        }
    })
}

async fn sweep_once(registry: &JobRegistry, upload_root: &Path, retention_secs: u64) {
    let now = Utc::now();
    for job in registry.snapshot().await {
        let age = job.age_secs(now);
        let expired = if job.status.is_terminal() {
            age >= retention_secs as i64
        } else {
            age >= (retention_secs as i64).saturating_mul(4)
        };
        if expired {
            info!(job_id = %job.id, status = %job.status, age_secs = age, "reaping expired job");
            registry.remove(job.id).await;
            // Jobs always live directly under the upload root.
            remove_job_dir(&upload_root.join(job.id.to_string())).await;
        }
    }
}
