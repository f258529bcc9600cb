//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper auto builder, HTTP/1.1 or HTTP/2)
//!     → request.rs (host, target, client address)
//!     → [routing engine decides]
//!     → response.rs (redirect, fixed response, or close)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::request_facts;
pub use response::{render, CloseConnection, Rendered, ResponseBody};
pub use server::{AppState, HttpServer, ServerError, DRAIN_TIMEOUT};
