use crate::config::normalize_extensions;
use crate::error::{FinderError, Result};
use crate::models::{ImageEntry, ScanConfig, ScanResult, ScanStats, BYTES_PER_MB};
use indicatif::{ProgressBar, ProgressStyle};
use jwalk::{Parallelism, WalkDir};
use std::io::ErrorKind;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What happened to a single image candidate
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Qualified(ImageEntry),
    BelowThreshold { size_bytes: u64 },
    Missing,
    Failed(String),
}

/// Walks a directory tree and collects images larger than the configured threshold
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(mut config: ScanConfig) -> Self {
        config.extensions = normalize_extensions(&config.extensions);
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `root_path`, which must be an existing directory
    pub fn scan<P: AsRef<Path>>(&self, root_path: P) -> Result<ScanResult> {
        let root_path = root_path.as_ref();
        if !root_path.is_dir() {
            return Err(FinderError::InvalidInputDirectory(root_path.to_path_buf()));
        }

        info!("Starting scan of: {}", root_path.display());
        info!(
            "Scan configuration: threshold={:.1} MB, extensions={}",
            self.config.threshold_mb(),
            self.config.extensions.join(",")
        );

        let progress = self.progress_bar();
        let started = Instant::now();

        let mut result = ScanResult::default();
        let mut stats = ScanStats::default();

        let mut walker = WalkDir::new(root_path)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(false)
            .sort(true)
            .parallelism(Parallelism::Serial);

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    stats.errors_encountered += 1;
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            // Symlinked directories are directories, not files
            if entry.file_type().is_symlink()
                && std::fs::metadata(entry.path()).map(|m| m.is_dir()).unwrap_or(false)
            {
                continue;
            }

            stats.files_scanned += 1;
            if stats.files_scanned % 1000 == 0 {
                progress.set_message(format!(
                    "Scanned: {} files, {} images, {} large",
                    stats.files_scanned,
                    result.total_image_count,
                    result.entries.len()
                ));
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if !is_image_file(&name, &self.config.extensions) {
                continue;
            }
            result.total_image_count += 1;

            let joined = entry.path().to_string_lossy().to_string();
            match self.inspect(&joined, &name) {
                FileOutcome::Qualified(image) => {
                    stats.total_image_bytes += image.size_bytes;
                    result.entries.push(image);
                }
                FileOutcome::BelowThreshold { size_bytes } => {
                    debug!("Below threshold ({} bytes): {}", size_bytes, joined);
                }
                FileOutcome::Missing => {
                    stats.missing_paths += 1;
                    warn!("File does not exist: {}", decode_path(&joined));
                }
                FileOutcome::Failed(reason) => {
                    stats.errors_encountered += 1;
                    warn!("Skipping {}: {}", decode_path(&joined), reason);
                }
            }
        }

        progress.finish_and_clear();

        stats.duration_secs = started.elapsed().as_secs_f64();
        result.stats = stats;

        info!(
            "Scan completed: {} files, {} images, {} above threshold",
            result.stats.files_scanned,
            result.total_image_count,
            result.entries.len()
        );

        if result.stats.errors_encountered > 0 {
            warn!("Encountered {} errors during scan", result.stats.errors_encountered);
        }

        Ok(result)
    }

    /// Decode `joined_path` and check it against the size threshold
    pub fn inspect(&self, joined_path: &str, name: &str) -> FileOutcome {
        let decoded = decode_path(joined_path);

        let metadata = match std::fs::metadata(PathBuf::from(&decoded)) {
            Ok(metadata) => metadata,
            Err(e) if is_missing_error(&e) => return FileOutcome::Missing,
            Err(e) => return FileOutcome::Failed(e.to_string()),
        };

        let size_bytes = metadata.len();
        if size_bytes <= self.config.size_threshold_bytes {
            return FileOutcome::BelowThreshold { size_bytes };
        }

        let server_url = build_server_url(&self.config.base_url, &decoded);
        FileOutcome::Qualified(ImageEntry {
            path: decoded,
            name: name.to_string(),
            size_mb: round_one_decimal(bytes_to_mb(size_bytes)),
            size_bytes,
            server_url,
        })
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let progress = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            progress.set_style(style);
        }
        progress
    }
}

/// Errors meaning the decoded path names nothing on disk: absent, routed
/// through a regular file, or not representable (embedded NUL)
fn is_missing_error(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::InvalidInput
    )
}

/// Simple scan function for tests and basic use cases
pub fn scan_directory<P: AsRef<Path>>(root_path: P, config: ScanConfig) -> Result<ScanResult> {
    Scanner::new(config).scan(root_path)
}

/// Case-insensitive suffix match; `extensions` must already be lowercase
pub fn is_image_file(name: &str, extensions: &[String]) -> bool {
    let lower = name.to_lowercase();
    extensions.iter().any(|ext| lower.ends_with(ext.as_str()))
}

/// Undo percent-encoding; invalid UTF-8 in the result becomes U+FFFD
pub fn decode_path(path: &str) -> String {
    if !path.contains('%') {
        return path.to_string();
    }
    let decoded = urlencoding::decode_binary(path.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

pub fn build_server_url(base_url: &str, decoded_path: &str) -> String {
    let normalized: String = decoded_path
        .chars()
        .map(|c| if c == MAIN_SEPARATOR { '/' } else { c })
        .collect();
    format!("{}{}", base_url, normalized)
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
