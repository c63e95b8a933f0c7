use crate::error::{FinderError, Result};
use crate::models::ScanConfig;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Load a [`ScanConfig`] from a JSON file. Missing keys keep their defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ScanConfig> {
    let path = path.as_ref();
    let file = File::open(path)?;

    let config: ScanConfig = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| FinderError::Config(format!("{}: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    normalize(config)
}

/// Lowercase extensions, add the leading dot and reject unusable settings
pub fn normalize(mut config: ScanConfig) -> Result<ScanConfig> {
    config.extensions = normalize_extensions(&config.extensions);

    if config.extensions.is_empty() {
        return Err(FinderError::Config("extension list is empty".to_string()));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(FinderError::Config("output directory is empty".to_string()));
    }

    Ok(config)
}

pub fn normalize_extensions<S: AsRef<str>>(extensions: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(extensions.len());

    for ext in extensions {
        let ext = ext.as_ref().trim().to_lowercase();
        if ext.is_empty() || ext == "." {
            continue;
        }
        let ext = if ext.starts_with('.') { ext } else { format!(".{}", ext) };
        if !normalized.contains(&ext) {
            normalized.push(ext);
        }
    }

    normalized
}
