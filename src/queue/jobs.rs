// Job payloads handed to the worker

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::types::SplitMode;

/// Everything the worker needs to process one upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitJob {
    pub job_id: Uuid,
    /// Per-job temp directory; removed on failure and after download.
    pub job_dir: PathBuf,
    pub input_path: PathBuf,
    pub mode: SplitMode,
    /// Extension (with dot) carried over from the uploaded file name.
    pub output_ext: String,
}
