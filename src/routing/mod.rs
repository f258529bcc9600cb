//! Routing subsystem: the matching and rewrite engine.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, request-target, method)
//!     → router.rs (domain lookup, ordered rule scan, default resolution)
//!     → matcher.rs (host matching, pattern rewrite)
//!     → Return: Decision { Redirect | Fixed | Close, labels }
//! ```
//!
//! # Design Decisions
//! - Rules compiled at load time, immutable at runtime
//! - Deterministic: same input always yields the same decision
//! - First match wins (declaration order)
//! - The engine never performs I/O; callers log and count from the Decision

pub mod matcher;
pub mod outcome;
pub mod router;

pub use matcher::host_matches;
pub use outcome::{Decision, Hit, Outcome, RequestFacts, RuleIndex, DEFAULT_LABEL};
pub use router::{decide, find_domain};
