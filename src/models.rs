use crate::config::Config;
use crate::registry::{Job, JobRegistry};
use crate::types::JobStatus;

#[derive(Clone)]
pub struct AppState {
    pub registry: JobRegistry,
    pub config: Config,
}

// HTTP request/response DTOs

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UploadResponse {
    pub job_id: uuid::Uuid,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JobStatusResponse {
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_parts: Option<usize>,
    pub completed_parts: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Job> for JobStatusResponse {
    fn from(job: &Job) -> Self {
        Self {
            status: job.status,
            message: job.message.clone(),
            total_parts: job.total_parts,
            completed_parts: job.completed_parts,
            created_at: job.created_at,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
