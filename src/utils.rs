use crate::error::{FinderError, Result};
use crate::models::ExportFormat;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Format bytes in human-readable binary units (e.g., 4.2 MB)
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Format a large number with thousands separators
pub fn format_number(num: u64) -> String {
    let s = num.to_string();
    let mut result = String::new();

    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }

    result
}

/// Check that the scan root exists, is a directory and can be listed
pub fn validate_path(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(FinderError::InvalidInputDirectory(path.to_path_buf()));
    }

    std::fs::read_dir(path).map_err(|_| FinderError::InvalidInputDirectory(path.to_path_buf()))?;

    Ok(())
}

/// Create the output directory, including parents, if it doesn't exist
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    std::fs::create_dir_all(dir).map_err(|source| FinderError::OutputDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

/// `large_images_YYYYMMDD_HHMMSS.<ext>`
pub fn output_file_name(timestamp: NaiveDateTime, format: ExportFormat) -> String {
    format!(
        "large_images_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

pub fn output_file_path(dir: &Path, timestamp: NaiveDateTime, format: ExportFormat) -> PathBuf {
    dir.join(output_file_name(timestamp, format))
}
