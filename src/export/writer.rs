use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;

use super::{ExportFormat, export_filename, format_export};
use crate::models::ExtractionResult;

/// Format `result` and write it into `dir` under the standard export filename.
///
/// Returns the path written. The directory is created when missing.
pub fn write_export(result: &ExtractionResult, format: ExportFormat, dir: &Path) -> Result<PathBuf> {
    let filename = export_filename(&result.title, format, Local::now().date_naive());
    write_export_to(result, format, &dir.join(filename))
}

/// Format `result` and write it to exactly `path`
pub fn write_export_to(result: &ExtractionResult, format: ExportFormat, path: &Path) -> Result<PathBuf> {
    let content = format_export(result, format).context("Failed to format export")?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .with_context(|| format!("Failed to write export: {}", path.display()))?;
    info!(path = %path.display(), messages = result.message_count, "Wrote export");
    Ok(path.to_path_buf())
}
