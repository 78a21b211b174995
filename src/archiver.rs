//! Zip assembly for finished segments.

use std::fs::File;
use std::io::copy;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::types::{AppError, AppResult};

/// Write `parts` (already in ascending index order) into a zip at `dest`.
///
/// Entry names are the part file names, so the archive unpacks to
/// `part_000.mp4`, `part_001.mp4`, ... Blocking; callers on the runtime
/// should wrap this in `spawn_blocking`.
pub fn archive_parts(parts: &[PathBuf], dest: &Path) -> AppResult<()> {
    if parts.is_empty() {
        return Err(AppError::InvalidParameter(
            "no segment files to archive".to_string(),
        ));
    }

    let file = File::create(dest)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for part in parts {
        let name = part
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                AppError::InvalidParameter(format!("bad segment file name: {}", part.display()))
            })?;
        zip.start_file(name, options)?;
        let mut src = File::open(part)?;
        copy(&mut src, &mut zip)?;
    }

    zip.finish()?;
    Ok(())
}
