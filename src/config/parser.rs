//! Configuration file parsing.
//!
//! Files are HOCON. HOCON is a superset of JSON, so a legacy `config.json`
//! with the same keys loads unchanged.

use std::path::Path;

use hocon::{Error as HoconError, HoconLoader};

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a file on disk.
///
/// The file is read up front so a missing or unreadable file is reported as
/// an I/O error with its path, separately from syntax problems.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    load_config_str(&content)
}

/// Load configuration from in-memory HOCON or JSON text.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .and_then(|loader| loader.resolve())
        .map_err(|e: HoconError| ConfigError::ParseError {
            message: e.to_string(),
        })
}
