//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine Decision (domain, rule_index, code, log_hits)
//!     → logging.rs (hit event when log_hits is set)
//!     → metrics.rs (counter + histogram for every request)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The engine only decides what to record; this module records it
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
