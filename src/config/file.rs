//! Configuration file loading.

use crate::config::types::Config;
use crate::config::{paths, validate_config};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

/// Load configuration from a specific TOML file.
pub fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&text).map_err(|e| Error::ConfigParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from the platform default location.
///
/// A missing file yields the built-in defaults; a present but malformed
/// file is an error.
pub fn load_default_config() -> Result<Config> {
    let path = paths::config_file_path()?;
    if path.exists() {
        debug!("loading config from {}", path.display());
        load_config(&path)
    } else {
        debug!("no config file at {}, using defaults", path.display());
        Ok(Config::default())
    }
}

/// Save configuration to a specific TOML file, creating parent directories.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let text = toml::to_string_pretty(config).map_err(|e| Error::ConfigSerialize { source: e })?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(path, text).map_err(|e| Error::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
