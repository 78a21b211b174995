//! Split planning.
//!
//! Turns a split mode plus probed metadata into an ordered list of
//! (start, duration) ranges covering the whole file with no gaps or
//! overlaps. Boundaries are plain timestamp arithmetic; seek accuracy is
//! ffmpeg's problem, not ours.

use crate::probe::MediaInfo;
use crate::types::{AppError, AppResult, SplitMode};

/// Parts shorter than this make no sense for stream-copy extraction.
const MIN_PART_SECONDS: f64 = 1.0;

/// One contiguous time range of the source video.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Segment {
    /// Offset from the start of the file, in seconds.
    pub start: f64,
    /// Length of this part, in seconds.
    pub duration: f64,
}

/// Plan segments for `mode` given probed metadata.
pub fn plan(mode: SplitMode, info: &MediaInfo) -> AppResult<Vec<Segment>> {
    let duration = info.duration.ok_or_else(|| {
        AppError::UnsupportedMedia("could not determine video duration".to_string())
    })?;

    match mode {
        SplitMode::ByCount(n) => by_count(duration, n),
        SplitMode::BySize(max_mb) => by_size(duration, info.size, info.bit_rate, max_mb),
    }
}

/// `n` equal-duration ranges. The final range absorbs the floating point
/// remainder so the plan always ends exactly at `total_duration`.
///
/// Plans whose parts would fall under [`MIN_PART_SECONDS`] are rejected
/// before anything is allocated; a bad count fails the job, not the process.
pub fn by_count(total_duration: f64, n: u32) -> AppResult<Vec<Segment>> {
    if n == 0 {
        return Err(AppError::InvalidParameter(
            "part count must be greater than zero".to_string(),
        ));
    }
    if total_duration <= 0.0 {
        return Err(AppError::InvalidParameter(
            "total duration must be positive".to_string(),
        ));
    }
    if n > 1 && total_duration / (n as f64) < MIN_PART_SECONDS {
        return Err(AppError::InvalidParameter(format!(
            "{} parts over {:.2}s would make parts shorter than {}s",
            n, total_duration, MIN_PART_SECONDS
        )));
    }

    let per_part = total_duration / n as f64;
    let mut segments = Vec::with_capacity(n as usize);
    for i in 0..n {
        let start = i as f64 * per_part;
        let duration = if i == n - 1 {
            total_duration - start
        } else {
            per_part
        };
        segments.push(Segment { start, duration });
    }
    Ok(segments)
}

/// Estimate how many parts keep each one under `max_mb`, then split evenly.
///
/// Bytes-per-second comes from the container bit rate when ffprobe reports
/// one, otherwise from filesize over duration. Per-part duration is floored
/// at one second so absurd size limits on high-bitrate files still produce
/// a workable plan.
pub fn by_size(
    total_duration: f64,
    total_size: u64,
    bit_rate: Option<u64>,
    max_mb: f64,
) -> AppResult<Vec<Segment>> {
    if max_mb <= 0.0 {
        return Err(AppError::InvalidParameter(
            "max part size must be greater than zero".to_string(),
        ));
    }
    if total_duration <= 0.0 {
        return Err(AppError::InvalidParameter(
            "total duration must be positive".to_string(),
        ));
    }

    let bytes_per_sec = match bit_rate {
        Some(b) => b as f64 / 8.0,
        None => total_size as f64 / total_duration,
    };
    if bytes_per_sec <= 0.0 {
        return Err(AppError::InvalidParameter(
            "could not estimate bytes per second for size-based split".to_string(),
        ));
    }

    let target_bytes = max_mb * 1024.0 * 1024.0;
    let max_part_duration = (target_bytes / bytes_per_sec).max(MIN_PART_SECONDS);
    // At most one part per whole MIN_PART_SECONDS slot, so the floor
    // survives the ceil for short inputs.
    let max_parts = (total_duration / MIN_PART_SECONDS).floor().max(1.0);
    let n = (total_duration / max_part_duration)
        .ceil()
        .clamp(1.0, max_parts) as u32;

    by_count(total_duration, n)
}
