//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse & deserialize, compile rule patterns)
//!     → validation.rs (semantic checks, all problems collected)
//!     → Config (validated, immutable)
//!     → shared via Arc to every request
//!
//! On reload (SIGHUP or watcher.rs):
//!     loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the whole Arc<Config>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - Absent fields decode to zero values, unknown fields are errors
//! - An uncompilable pattern is a parse error, everything else is a problem list

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError, Format};
pub use schema::{Config, DefaultResponse, Domain, Headers, RawRule, Rule};
pub use validation::{validate, ValidationError};
