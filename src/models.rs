use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extensions recognized as images, matched as a case-insensitive suffix
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"];

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// 3 MB; images must be strictly larger than this to qualify
pub const DEFAULT_SIZE_THRESHOLD: u64 = 3 * BYTES_PER_MB;

pub const DEFAULT_BASE_URL: &str = "https://";

pub const DEFAULT_OUTPUT_DIR: &str = "result";

/// A qualifying image found during a scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageEntry {
    /// Percent-decoded filesystem path
    pub path: String,

    /// File name as yielded by the directory walk
    pub name: String,

    /// Size in MB, rounded to one decimal place
    pub size_mb: f64,

    /// Raw size in bytes
    pub size_bytes: u64,

    /// Base URL followed by the path with separators normalized to `/`
    pub server_url: String,
}

/// Output of a single scan invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    /// Qualifying images in traversal order
    pub entries: Vec<ImageEntry>,

    /// Every file whose name matched the extension set, regardless of size or existence
    pub total_image_count: u64,

    pub stats: ScanStats,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Statistics about a completed scan
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanStats {
    /// Non-directory entries visited by the walk
    pub files_scanned: u64,

    /// Image files whose decoded path did not exist
    pub missing_paths: u64,

    /// Walk or metadata failures that were skipped
    pub errors_encountered: u64,

    /// Combined size of all qualifying images
    pub total_image_bytes: u64,

    /// Duration of scan in seconds
    pub duration_secs: f64,
}

impl ScanStats {
    pub fn files_per_second(&self) -> f64 {
        if self.duration_secs > 0.0 {
            self.files_scanned as f64 / self.duration_secs
        } else {
            0.0
        }
    }
}

/// Spreadsheet format written by the exporter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Parquet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Parquet => "parquet",
        }
    }
}

/// Settings shared by the scanner and the exporter
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Lowercase extensions with a leading dot
    pub extensions: Vec<String>,

    /// Images must be strictly larger than this many bytes
    pub size_threshold_bytes: u64,

    /// Prefix for every server URL
    pub base_url: String,

    /// Directory receiving the exported spreadsheet
    pub output_dir: PathBuf,

    pub format: ExportFormat,

    /// Whether to follow symbolic links while walking
    pub follow_symlinks: bool,

    /// Maximum depth to scan (None = unlimited)
    pub max_depth: Option<usize>,

    /// Show a spinner while scanning
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            size_threshold_bytes: DEFAULT_SIZE_THRESHOLD,
            base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            format: ExportFormat::Xlsx,
            follow_symlinks: false,
            max_depth: None,
            show_progress: false,
        }
    }
}

impl ScanConfig {
    /// Threshold expressed in MB, for messages
    pub fn threshold_mb(&self) -> f64 {
        self.size_threshold_bytes as f64 / BYTES_PER_MB as f64
    }
}
