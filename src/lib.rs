pub mod config;
pub mod error;
pub mod models;
pub mod scanner;
pub mod utils;
pub mod writer;

pub use error::{FinderError, Result};
pub use models::{ExportFormat, ImageEntry, ScanConfig, ScanResult, ScanStats};
pub use scanner::{scan_directory, Scanner};
pub use writer::{Exporter, COLUMN_HEADERS};
