//! # Configuration Files
//!
//! Reads a [`SluiceConfig`] from TOML. Without an explicit path the CLI
//! looks for `sluice.toml` in the working directory and falls back to
//! defaults (PassThrough, in-memory property store).

use sluice_core::{SluiceConfig, SluiceError};
use std::path::Path;

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "sluice.toml";

/// Written by `sluice init`.
pub const STARTER_CONFIG: &str = r#"# Sluice configuration

[store]
# redb database for critical-resource records; omit to keep them in memory
path = "sluice.redb"
cohorts = ["dom"]

[server]
# periodic statistics report, 0 disables it
stats_report_interval_secs = 300

[global]
level = "CoreFilters"
enable = ["remove_comments,collapse_whitespace"]
disable = []
retain_comments = ["[if *"]

[global.options]
css_inline_max_bytes = 2048
finder_properties_cache_expiration_time_ms = 7200000

[hosts."www.example.com"]
enable = ["rewrite_images"]
disable = ["combine_css"]
domains = ["cdn.example.com"]
resources = [{ disallow = "*.pdf" }]
"#;

/// Parse configuration text.
pub fn parse_config(text: &str) -> Result<SluiceConfig, SluiceError> {
    toml::from_str(text).map_err(|e| SluiceError::ConfigError(e.to_string()))
}

/// Read and parse a configuration file.
pub fn load_config(path: &Path) -> Result<SluiceConfig, SluiceError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        SluiceError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(SluiceError::ConfigError(format!(
            "Config file size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|e| {
        SluiceError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    let config = parse_config(&text)?;
    tracing::info!(path = %path.display(), hosts = config.hosts.len(), "Configuration loaded");
    Ok(config)
}

/// Load `path` if given, else `sluice.toml` if present, else defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<SluiceConfig, SluiceError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let fallback = Path::new(DEFAULT_CONFIG_FILE);
            if fallback.is_file() {
                load_config(fallback)
            } else {
                tracing::debug!("No configuration file, using defaults");
                Ok(SluiceConfig::default())
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
