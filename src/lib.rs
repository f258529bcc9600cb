//! Host-based HTTP redirect gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request       ┌─────────┐    ┌─────────┐    ┌──────────────┐
//!     ────────────────────▶│   net   │───▶│  http   │───▶│   routing    │
//!                          │listener │    │ server  │    │   engine     │
//!                          └─────────┘    └─────────┘    └──────┬───────┘
//!                                                               │ Decision
//!     Client Response      ┌──────────────────────────┐         │
//!     ◀────────────────────│ http::response (redirect,│◀────────┘
//!                          │ fixed response or close) │
//!                          └──────────────────────────┘
//!
//!     Cross-cutting: config (load, validate, reload), observability
//!     (hit log, Prometheus metrics), lifecycle (startup, signals, shutdown)
//! ```
//!
//! The routing engine is a pure function of the live [`config::Config`] and
//! the request facts; everything with side effects lives around it.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::Config;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
