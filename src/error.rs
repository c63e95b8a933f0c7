use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a scan or an export step.
///
/// Per-file conditions (a decoded path that does not exist, an unreadable
/// file) are not represented here: the scanner logs them, counts them in
/// [`ScanStats`](crate::models::ScanStats) and moves on.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("not a valid directory: {}", .0.display())]
    InvalidInputDirectory(PathBuf),

    #[error("failed to create output directory {}: {source}", .path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no image entries to export")]
    NothingToExport,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write {}: {message}", .path.display())]
    Export { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinderError>;
