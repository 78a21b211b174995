//! Media metadata via ffprobe.
//!
//! Shells out to `ffprobe` for the container-level duration, size and
//! bit rate. When ffprobe is unavailable or refuses the file we fall back
//! to the filesystem size; the planner then rejects the job because no
//! duration is known.

use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::warn;

use crate::types::AppResult;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    /// Container duration in seconds, when ffprobe reports one.
    pub duration: Option<f64>,
    /// File size in bytes.
    pub size: u64,
    /// Container bit rate in bits per second, when reported.
    pub bit_rate: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
}

// ffprobe prints numeric format fields as JSON strings.
#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    bit_rate: Option<String>,
}

pub async fn probe(ffprobe_path: &str, input: &Path) -> AppResult<MediaInfo> {
    let output = Command::new(ffprobe_path)
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration,size,bit_rate")
        .arg("-print_format")
        .arg("json")
        .arg(input)
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => {
            let mut info = parse_probe_output(&out.stdout);
            if info.size == 0 {
                info.size = tokio::fs::metadata(input).await?.len();
            }
            Ok(info)
        }
        Ok(out) => {
            warn!(
                input = %input.display(),
                code = ?out.status.code(),
                "ffprobe returned non-zero, falling back to file size"
            );
            fallback_info(input).await
        }
        Err(e) => {
            warn!(error = %e, "could not run ffprobe, falling back to file size");
            fallback_info(input).await
        }
    }
}

async fn fallback_info(input: &Path) -> AppResult<MediaInfo> {
    let size = tokio::fs::metadata(input).await?.len();
    Ok(MediaInfo {
        duration: None,
        size,
        bit_rate: None,
    })
}

fn parse_probe_output(stdout: &[u8]) -> MediaInfo {
    let parsed: ProbeOutput = match serde_json::from_slice(stdout) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "unparseable ffprobe output");
            return MediaInfo::default();
        }
    };

    let Some(format) = parsed.format else {
        return MediaInfo::default();
    };

    MediaInfo {
        duration: format
            .duration
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| *d > 0.0),
        size: format
            .size
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0),
        bit_rate: format
            .bit_rate
            .and_then(|b| b.parse::<u64>().ok())
            .filter(|b| *b > 0),
    }
}
