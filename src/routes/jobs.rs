//! Job endpoints: upload, status, download.
//!
//! Uploads stream multipart chunks straight to the per-job temp directory;
//! downloads stream the finished zip back and remove the job afterwards.
//! Neither path buffers a whole file in memory.

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cleanup;
use crate::models::{AppState, JobStatusResponse, UploadResponse};
use crate::queue::{SplitJob, Worker};
use crate::registry::{Job, JobRegistry};
use crate::types::{AppError, AppResult, JobStatus, SplitMode};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", post(create_job))
        .route("/api/jobs/{id}", get(job_status))
        .route("/api/jobs/{id}/download", get(download_archive))
        // Video uploads routinely exceed the default 2 MB body cap.
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

async fn create_job(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let job_id = Uuid::new_v4();
    let job_dir = state.config.storage.upload_root.join(job_id.to_string());

    let accepted = match read_upload(multipart, &job_dir).await {
        Ok(accepted) => accepted,
        Err(e) => {
            // Half-written input must not leak disk space.
            cleanup::remove_job_dir(&job_dir).await;
            return Err(e);
        }
    };

    info!(
        job_id = %job_id,
        mode = %accepted.mode,
        input = %accepted.source_path.display(),
        "upload accepted"
    );

    state
        .registry
        .insert(Job::new(
            job_id,
            job_dir.clone(),
            accepted.source_path.clone(),
            accepted.mode,
        ))
        .await;

    Worker::new(state.registry.clone(), state.config.clone()).spawn(SplitJob {
        job_id,
        job_dir,
        input_path: accepted.source_path,
        mode: accepted.mode,
        output_ext: accepted.output_ext,
    });

    Ok(Json(UploadResponse { job_id }))
}

async fn job_status(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> AppResult<Json<JobStatusResponse>> {
    let job = state
        .registry
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("unknown job {}", id)))?;
    Ok(Json(JobStatusResponse::from(&job)))
}

async fn download_archive(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> AppResult<Response> {
    let job = state
        .registry
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("unknown job {}", id)))?;

    if job.status != JobStatus::Done {
        return Err(AppError::NotReady(format!(
            "job is {}, not done",
            job.status
        )));
    }

    let archive_path = job
        .archive_path
        .ok_or_else(|| AppError::NotFound("archive not recorded for job".to_string()))?;
    let file = tokio::fs::File::open(&archive_path)
        .await
        .map_err(|_| AppError::NotFound("archive file missing".to_string()))?;

    let content_type = mime_guess::from_path(&archive_path)
        .first_or_octet_stream()
        .to_string();

    // The guard rides along with the stream; when the response body is
    // dropped (fully sent or client gone) the job and its directory go away.
    let guard = CleanupGuard {
        registry: state.registry.clone(),
        id,
        dir: job.job_dir.clone(),
    };
    let stream = ReaderStream::new(file).map(move |chunk| {
        let _keep_alive = &guard;
        chunk
    });

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.zip\"", id),
        ),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}

struct CleanupGuard {
    registry: JobRegistry,
    id: Uuid,
    dir: PathBuf,
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        let registry = self.registry.clone();
        let id = self.id;
        let dir = self.dir.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                registry.remove(id).await;
                cleanup::remove_job_dir(&dir).await;
            });
        }
    }
}

struct AcceptedUpload {
    source_path: PathBuf,
    output_ext: String,
    mode: SplitMode,
}

/// Drain the multipart form, streaming the file field to disk.
async fn read_upload(mut multipart: Multipart, job_dir: &Path) -> AppResult<AcceptedUpload> {
    let mut mode_text: Option<String> = None;
    let mut count_text: Option<String> = None;
    let mut size_text: Option<String> = None;
    let mut file: Option<(PathBuf, String)> = None;

    while let Some(mut field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let original = field.file_name().unwrap_or("input.mp4").to_string();
                // Strip any path components a hostile client sends along.
                let file_name = Path::new(&original)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("input.mp4")
                    .to_string();
                let output_ext = Path::new(&file_name)
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| ".mp4".to_string());

                let input_dir = job_dir.join("input");
                tokio::fs::create_dir_all(&input_dir).await?;
                let path = input_dir.join(&file_name);

                let mut out = tokio::fs::File::create(&path).await?;
                let mut written: u64 = 0;
                while let Some(chunk) = field.chunk().await? {
                    written += chunk.len() as u64;
                    out.write_all(&chunk).await?;
                }
                out.flush().await?;
                debug!(path = %path.display(), bytes = written, "upload written to disk");

                file = Some((path, output_ext));
            }
            "mode" => mode_text = Some(field.text().await?),
            "count" => count_text = Some(field.text().await?),
            "size_mb" => size_text = Some(field.text().await?),
            other => debug!(field = other, "ignoring unknown multipart field"),
        }
    }

    let (source_path, output_ext) = file.ok_or_else(|| {
        AppError::InvalidParameter("multipart field 'file' is required".to_string())
    })?;
    let mode = parse_mode(
        mode_text.as_deref(),
        count_text.as_deref(),
        size_text.as_deref(),
    )?;

    Ok(AcceptedUpload {
        source_path,
        output_ext,
        mode,
    })
}

fn parse_mode(
    mode: Option<&str>,
    count: Option<&str>,
    size_mb: Option<&str>,
) -> AppResult<SplitMode> {
    match mode {
        Some("count") => {
            let n: u32 = count
                .ok_or_else(|| {
                    AppError::InvalidParameter(
                        "'count' must be provided for mode 'count'".to_string(),
                    )
                })?
                .trim()
                .parse()
                .map_err(|_| {
                    AppError::InvalidParameter("'count' must be a positive integer".to_string())
                })?;
            if n == 0 {
                return Err(AppError::InvalidParameter(
                    "'count' must be greater than zero".to_string(),
                ));
            }
            Ok(SplitMode::ByCount(n))
        }
        Some("size") => {
            let mb: f64 = size_mb
                .ok_or_else(|| {
                    AppError::InvalidParameter(
                        "'size_mb' must be provided for mode 'size'".to_string(),
                    )
                })?
                .trim()
                .parse()
                .map_err(|_| {
                    AppError::InvalidParameter("'size_mb' must be a number".to_string())
                })?;
            if mb <= 0.0 {
                return Err(AppError::InvalidParameter(
                    "'size_mb' must be greater than zero".to_string(),
                ));
            }
            Ok(SplitMode::BySize(mb))
        }
        Some(other) => Err(AppError::InvalidParameter(format!(
            "mode must be 'count' or 'size', got '{}'",
            other
        ))),
        None => Err(AppError::InvalidParameter(
            "multipart field 'mode' is required".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, FfmpegConfig, ServerConfig, StorageConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            registry: JobRegistry::new(),
            config: Config {
                server: ServerConfig {
                    port: 0,
                    host: "127.0.0.1".to_string(),
                    cors_allowed_origins: vec![],
                },
                storage: StorageConfig {
                    upload_root: std::env::temp_dir().join("vidsplit-route-tests"),
                    retention_secs: 3600,
                },
                ffmpeg: FfmpegConfig {
                    ffmpeg_path: "ffmpeg".to_string(),
                    ffprobe_path: "ffprobe".to_string(),
                    timeout_secs: 5,
                },
            },
        }
    }

    #[test]
    fn parse_mode_count() {
        assert_eq!(
            parse_mode(Some("count"), Some("4"), None).unwrap(),
            SplitMode::ByCount(4)
        );
    }

    #[test]
    fn parse_mode_size() {
        assert_eq!(
            parse_mode(Some("size"), None, Some("30.5")).unwrap(),
            SplitMode::BySize(30.5)
        );
    }

    #[test]
    fn parse_mode_rejects_bad_values() {
        assert!(parse_mode(None, None, None).is_err());
        assert!(parse_mode(Some("banana"), None, None).is_err());
        assert!(parse_mode(Some("count"), None, None).is_err());
        assert!(parse_mode(Some("count"), Some("0"), None).is_err());
        assert!(parse_mode(Some("count"), Some("-2"), None).is_err());
        assert!(parse_mode(Some("size"), None, Some("0")).is_err());
        assert!(parse_mode(Some("size"), None, Some("abc")).is_err());
    }

    #[tokio::test]
    async fn status_for_unknown_job_is_404() {
        let app = router(test_state());
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/jobs/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn download_before_done_is_rejected() {
        let state = test_state();
        let job = Job::new(
            Uuid::new_v4(),
            PathBuf::from("/tmp/x"),
            PathBuf::from("/tmp/x/input/in.mp4"),
            SplitMode::ByCount(2),
        );
        let id = job.id;
        state.registry.insert(job).await;

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/jobs/{}/download", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_returns_job_fields() {
        let state = test_state();
        let mut job = Job::new(
            Uuid::new_v4(),
            PathBuf::from("/tmp/x"),
            PathBuf::from("/tmp/x/input/in.mp4"),
            SplitMode::ByCount(2),
        );
        job.status = JobStatus::Processing;
        job.total_parts = Some(2);
        job.completed_parts = 1;
        let id = job.id;
        state.registry.insert(job).await;

        let app = router(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/jobs/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let parsed: JobStatusResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed.status, JobStatus::Processing);
        assert_eq!(parsed.total_parts, Some(2));
        assert_eq!(parsed.completed_parts, 1);
    }
}
