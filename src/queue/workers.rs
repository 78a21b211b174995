//! Worker: the upload-to-archive lifecycle for one job.
//!
//! Each upload spawns one worker task; segments within a job run
//! sequentially, jobs run concurrently. The registry is the only shared
//! state. On any failure the job is marked failed and its temp directory
//! removed immediately; on success the directory lives until download or
//! the retention sweep.

use std::path::PathBuf;
use tracing::{error, info};

use crate::archiver;
use crate::cleanup;
use crate::config::Config;
use crate::executor;
use crate::planner;
use crate::probe;
use crate::queue::jobs::SplitJob;
use crate::registry::JobRegistry;
use crate::types::{AppError, AppResult, JobStatus};

#[derive(Clone)]
pub struct Worker {
    registry: JobRegistry,
    config: Config,
}

impl Worker {
    pub fn new(registry: JobRegistry, config: Config) -> Self {
        Self { registry, config }
    }

    /// Run `job` to completion on a background task.
    pub fn spawn(self, job: SplitJob) {
        tokio::spawn(async move {
            self.process_job(job).await;
        });
    }

    pub async fn process_job(&self, job: SplitJob) {
        let id = job.job_id;
        info!(job_id = %id, mode = %job.mode, "processing job");
        self.registry
            .set_status(id, JobStatus::Processing, "probing input")
            .await;

        match self.run(&job).await {
            Ok(archive_path) => {
                info!(job_id = %id, archive = %archive_path.display(), "job done");
                self.registry
                    .update(id, |j| {
                        j.status = JobStatus::Done;
                        j.message = Some("done".to_string());
                        j.archive_path = Some(archive_path.clone());
                    })
                    .await;
            }
            Err(e) => {
                error!(job_id = %id, error = %e, "job failed");
                self.registry.fail(id, e.to_string()).await;
                // No partial results are kept around.
                cleanup::remove_job_dir(&job.job_dir).await;
            }
        }
    }

    async fn run(&self, job: &SplitJob) -> AppResult<PathBuf> {
        let id = job.job_id;

        let info = probe::probe(&self.config.ffmpeg.ffprobe_path, &job.input_path).await?;
        let segments = planner::plan(job.mode, &info)?;

        self.registry
            .update(id, |j| {
                j.total_parts = Some(segments.len());
                j.message = Some(format!(
                    "splitting into {} parts (~{:.2}s each)",
                    segments.len(),
                    segments.first().map(|s| s.duration).unwrap_or(0.0)
                ));
            })
            .await;

        let out_dir = job.job_dir.join("output");
        tokio::fs::create_dir_all(&out_dir).await?;

        let mut produced = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            let output = executor::output_path(&out_dir, index, &job.output_ext);
            executor::extract_segment(&self.config.ffmpeg, &job.input_path, *segment, &output)
                .await?;
            produced.push(output);
            self.registry
                .update(id, |j| j.completed_parts = index + 1)
                .await;
        }

        let archive_path = job.job_dir.join(format!("{}.zip", id));
        let dest = archive_path.clone();
        tokio::task::spawn_blocking(move || archiver::archive_parts(&produced, &dest))
            .await
            .map_err(|e| AppError::ExecutionFailure(format!("archiver task panicked: {}", e)))??;

        Ok(archive_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FfmpegConfig, ServerConfig, StorageConfig};
    use crate::registry::Job;
    use crate::types::SplitMode;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn test_config(upload_root: PathBuf) -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec![],
            },
            storage: StorageConfig {
                upload_root,
                retention_secs: 3600,
            },
            ffmpeg: FfmpegConfig {
                // Guaranteed-missing tools: probe falls back to fs metadata,
                // which also fails because the input file does not exist.
                ffmpeg_path: "ffmpeg-definitely-not-installed".to_string(),
                ffprobe_path: "ffprobe-definitely-not-installed".to_string(),
                timeout_secs: 5,
            },
        }
    }

    #[tokio::test]
    async fn failure_marks_job_failed_and_removes_dir() {
        let root = tempdir().unwrap();
        let id = Uuid::new_v4();
        let job_dir = root.path().join(id.to_string());
        tokio::fs::create_dir_all(job_dir.join("input")).await.unwrap();
        let input_path = job_dir.join("input").join("missing.mp4");

        let registry = JobRegistry::new();
        registry
            .insert(Job::new(
                id,
                job_dir.clone(),
                input_path.clone(),
                SplitMode::ByCount(4),
            ))
            .await;

        let worker = Worker::new(registry.clone(), test_config(root.path().to_path_buf()));
        worker
            .process_job(SplitJob {
                job_id: id,
                job_dir: job_dir.clone(),
                input_path,
                mode: SplitMode::ByCount(4),
                output_ext: ".mp4".to_string(),
            })
            .await;

        let job = registry.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.message.is_some());
        assert!(job.archive_path.is_none());
        assert!(!job_dir.exists(), "failed job dir must be removed");
    }

    #[cfg(unix)]
    fn write_fake_tool(dir: &std::path::Path, name: &str, script: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn mid_sequence_segment_failure_aborts_and_cleans_up() {
        let tools = tempdir().unwrap();
        let ffprobe = write_fake_tool(
            tools.path(),
            "ffprobe",
            "#!/bin/sh\necho '{\"format\":{\"duration\":\"100.000000\",\"size\":\"104857600\"}}'\n",
        );
        // Succeeds for the first part, fails for every later one.
        let ffmpeg = write_fake_tool(
            tools.path(),
            "ffmpeg",
            "#!/bin/sh\n\
             for arg in \"$@\"; do out=$arg; done\n\
             case \"$out\" in\n\
               *part_000*) : > \"$out\"; exit 0 ;;\n\
               *) echo 'Conversion failed!' >&2; exit 1 ;;\n\
             esac\n",
        );

        let root = tempdir().unwrap();
        let id = Uuid::new_v4();
        let job_dir = root.path().join(id.to_string());
        let input_dir = job_dir.join("input");
        tokio::fs::create_dir_all(&input_dir).await.unwrap();
        let input_path = input_dir.join("in.mp4");
        tokio::fs::write(&input_path, b"fake video bytes").await.unwrap();

        let mut config = test_config(root.path().to_path_buf());
        config.ffmpeg.ffmpeg_path = ffmpeg;
        config.ffmpeg.ffprobe_path = ffprobe;

        let registry = JobRegistry::new();
        registry
            .insert(Job::new(
                id,
                job_dir.clone(),
                input_path.clone(),
                SplitMode::ByCount(4),
            ))
            .await;

        let worker = Worker::new(registry.clone(), config);
        worker
            .process_job(SplitJob {
                job_id: id,
                job_dir: job_dir.clone(),
                input_path,
                mode: SplitMode::ByCount(4),
                output_ext: ".mp4".to_string(),
            })
            .await;

        // Segment 2 of 4 failed: the first part completed, the rest were
        // aborted, no archive exists, and the partial outputs are gone.
        let job = registry.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.total_parts, Some(4));
        assert_eq!(job.completed_parts, 1);
        assert!(job
            .message
            .as_deref()
            .unwrap_or_default()
            .contains("Conversion failed!"));
        assert!(job.archive_path.is_none());
        assert!(!job_dir.exists(), "partial outputs must be removed");
    }

    #[tokio::test]
    async fn invalid_source_never_produces_archive() {
        let root = tempdir().unwrap();
        let id = Uuid::new_v4();
        let job_dir = root.path().join(id.to_string());
        let input_dir = job_dir.join("input");
        tokio::fs::create_dir_all(&input_dir).await.unwrap();
        // A real file that is not a video: probe fallback yields no
        // duration, so planning fails with UnsupportedMedia.
        let input_path = input_dir.join("not-a-video.mp4");
        tokio::fs::write(&input_path, b"plain text").await.unwrap();

        let registry = JobRegistry::new();
        registry
            .insert(Job::new(
                id,
                job_dir.clone(),
                input_path.clone(),
                SplitMode::BySize(30.0),
            ))
            .await;

        let worker = Worker::new(registry.clone(), test_config(root.path().to_path_buf()));
        worker
            .process_job(SplitJob {
                job_id: id,
                job_dir: job_dir.clone(),
                input_path,
                mode: SplitMode::BySize(30.0),
                output_ext: ".mp4".to_string(),
            })
            .await;

        let job = registry.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.archive_path.is_none());
        assert!(!job_dir.join(format!("{}.zip", id)).exists());
    }
}
