//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Emit the per-request hit record
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, text format for development
//! - Log level configurable via `RUST_LOG`, default `redirector=info`
//! - Hits go to their own target so they can be filtered apart from lifecycle events

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::routing::Hit;

/// Target of hit events, usable in `RUST_LOG` directives.
pub const HIT_TARGET: &str = "redirector::hits";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Install the global tracing subscriber.
pub fn init_logging(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "redirector=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Record one request that its rule or default response asked to log.
pub fn log_hit(hit: &Hit<'_>) {
    tracing::info!(
        target: HIT_TARGET,
        remote_addr = hit.remote_addr,
        method = hit.method,
        host = hit.host,
        request_uri = hit.request_uri,
        user_agent = hit.user_agent,
        referer = hit.referer,
        domain = hit.domain,
        rule_index = %hit.rule_index,
        code = hit.code,
        location = hit.location,
        "hit"
    );
}
