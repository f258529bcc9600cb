//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Report every problem before refusing to start
//!
//! # Design Decisions
//! - Fail fast: a configuration with any problem is fatal at startup
//! - The same check backs `--check`, so operators can validate before reloading

use std::path::Path;

use crate::config::{load_config, Config, ConfigError, ValidationError};

/// Why the process refused to start.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("configuration has {} problem(s)", .0.len())]
    Invalid(Vec<ValidationError>),
}

/// Load the configuration at `path`, logging and rejecting any problems.
pub fn load_validated(path: &Path) -> Result<Config, StartupError> {
    let (config, problems) = load_config(path)?;

    if !problems.is_empty() {
        for problem in &problems {
            tracing::error!(%problem, "Configuration problem");
        }
        return Err(StartupError::Invalid(problems));
    }

    tracing::info!(
        path = %path.display(),
        listen_address = %config.listen_address,
        domains = config.domains.len(),
        "Configuration loaded"
    );
    Ok(config)
}
