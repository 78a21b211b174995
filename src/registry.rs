//! In-memory job registry.
//!
//! One upload-to-archive request is a [`Job`]. All job state lives in this
//! process behind a single `RwLock`; nothing is persisted, so jobs are lost
//! on restart. Every mutation goes through the registry so concurrent
//! handlers and workers never share a bare map.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::{JobStatus, SplitMode};

#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Per-job temp directory: `<upload_root>/<id>`.
    pub job_dir: PathBuf,
    pub source_path: PathBuf,
    pub mode: SplitMode,
    pub status: JobStatus,
    pub message: Option<String>,
    pub total_parts: Option<usize>,
    pub completed_parts: usize,
    /// Set once the archiver succeeds.
    pub archive_path: Option<PathBuf>,
}

impl Job {
    pub fn new(id: Uuid, job_dir: PathBuf, source_path: PathBuf, mode: SplitMode) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            job_dir,
            source_path,
            mode,
            status: JobStatus::Pending,
            message: Some("queued".to_string()),
            total_parts: None,
            completed_parts: 0,
            archive_path: None,
        }
    }

    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.inner.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.inner.read().await.get(&id).cloned()
    }

    /// Apply `f` to the job if it exists. Returns false for unknown ids.
    pub async fn update<F>(&self, id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut Job),
    {
        match self.inner.write().await.get_mut(&id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }

    pub async fn set_status(&self, id: Uuid, status: JobStatus, message: impl Into<String>) {
        let message = message.into();
        self.update(id, |job| {
            job.status = status;
            job.message = Some(message);
        })
        .await;
    }

    pub async fn fail(&self, id: Uuid, message: impl Into<String>) {
        self.set_status(id, JobStatus::Failed, message).await;
    }

    pub async fn remove(&self, id: Uuid) -> Option<Job> {
        self.inner.write().await.remove(&id)
    }

    /// Cloned view of all jobs, for the retention sweep.
    pub async fn snapshot(&self) -> Vec<Job> {
        self.inner.read().await.values().cloned().collect()
    }
}
