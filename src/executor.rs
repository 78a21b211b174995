//! Segment extraction via ffmpeg.
//!
//! One ffmpeg invocation per planned range, stream-copying the range into
//! its own output file. Invocations are bounded by a timeout; on expiry
//! the child is killed (`kill_on_drop`) and the job fails.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::config::FfmpegConfig;
use crate::planner::Segment;
use crate::types::{AppError, AppResult};

/// Output file name for part `index`, e.g. `part_003.mp4`.
pub fn output_path(out_dir: &Path, index: usize, ext: &str) -> PathBuf {
    out_dir.join(format!("part_{:03}{}", index, ext))
}

/// Extract one planned range into `output`.
///
/// Uses `-ss` before `-i` (input seeking) plus `-t`, with `-map 0 -c copy`
/// so every stream is carried over without re-encoding.
pub async fn extract_segment(
    config: &FfmpegConfig,
    input: &Path,
    segment: Segment,
    output: &Path,
) -> AppResult<()> {
    debug!(
        input = %input.display(),
        output = %output.display(),
        start = segment.start,
        duration = segment.duration,
        "extracting segment"
    );

    let mut child = Command::new(&config.ffmpeg_path)
        .arg("-y")
        .arg("-ss")
        .arg(format!("{:.6}", segment.start))
        .arg("-i")
        .arg(input)
        .arg("-t")
        .arg(format!("{:.6}", segment.duration))
        .arg("-map")
        .arg("0")
        .arg("-c")
        .arg("copy")
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AppError::ExecutionFailure(format!("could not start ffmpeg: {}", e)))?;

    let wait = child.wait_with_output();
    let out = match timeout(Duration::from_secs(config.timeout_secs), wait).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(AppError::ExecutionFailure(format!(
                "ffmpeg timed out after {}s",
                config.timeout_secs
            )));
        }
    };

    if !out.status.success() {
        return Err(AppError::ExecutionFailure(format!(
            "ffmpeg exited with {}: {}",
            out.status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            stderr_tail(&out.stderr)
        )));
    }

    Ok(())
}

/// Last non-empty stderr line; ffmpeg puts the actionable message there.
fn stderr_tail(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("unknown error")
        .trim()
        .to_string()
}
