//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::Config;
use crate::config::validation::{validate, ValidationError};

/// Error type for configuration loading.
///
/// These are the structural failures: nothing usable came out of the file.
/// Semantic problems are returned as data next to the parsed config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Error parsing config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Error parsing config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Source syntax of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
}

impl Format {
    /// Pick the format from the file extension; anything but `.toml` is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Format::Toml,
            _ => Format::Json,
        }
    }
}

/// Parse and validate a configuration from text.
///
/// The built-in default response is filled in before validation when the
/// source defines none.
pub fn parse_config(
    content: &str,
    format: Format,
) -> Result<(Config, Vec<ValidationError>), ConfigError> {
    let config: Config = match format {
        Format::Json => serde_json::from_str(content)?,
        Format::Toml => toml::from_str(content)?,
    };
    let config = config.with_builtin_default();

    let problems = validate(&config);
    Ok((config, problems))
}

/// Load and validate configuration from a JSON or TOML file.
pub fn load_config(path: &Path) -> Result<(Config, Vec<ValidationError>), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_config(&content, Format::from_path(path))
}
