//! Request facts in, decisions out.
//!
//! These types are the engine's whole boundary. The HTTP layer builds a
//! [`RequestFacts`] from the wire, and renders the [`Decision`] it gets back.
//! Logging and metrics read their fields from the decision too.

use std::fmt;

use crate::config::DefaultResponse;

/// Label used for domain and rule index when the global default answered.
pub const DEFAULT_LABEL: &str = "default";

/// What the engine needs to know about one request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFacts<'a> {
    /// Authority as sent by the client, port included.
    pub host: &'a str,
    /// Path and query (the request-target, without scheme or host).
    pub target: &'a str,
    pub method: &'a str,
    /// Client address, already resolved against the trusted header.
    pub client_addr: &'a str,
    pub user_agent: &'a str,
    pub referer: &'a str,
}

/// Which rule answered, or that a default response did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleIndex {
    Rule(usize),
    Default,
}

impl fmt::Display for RuleIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleIndex::Rule(index) => write!(f, "{}", index),
            RuleIndex::Default => f.write_str(DEFAULT_LABEL),
        }
    }
}

/// The three ways a request can end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// Send the client to `location` with the decision's code.
    Redirect { location: String },
    /// Write this response verbatim.
    Fixed(&'a DefaultResponse),
    /// Drop the connection without writing a single byte.
    Close,
}

/// The engine's answer for one request, with its observability labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision<'a> {
    pub outcome: Outcome<'a>,
    /// Matched origin key, or [`DEFAULT_LABEL`].
    pub domain: &'a str,
    pub rule_index: RuleIndex,
    /// Resolved status code; 0 for [`Outcome::Close`].
    pub code: i64,
    /// Whether the caller should record this request.
    pub log_hits: bool,
}

impl<'a> Decision<'a> {
    /// Pair the decision with the request it answered, for logging.
    pub fn hit<'r>(&'r self, request: &'r RequestFacts<'r>) -> Hit<'r> {
        let location = match &self.outcome {
            Outcome::Redirect { location } => Some(location.as_str()),
            _ => None,
        };

        Hit {
            remote_addr: request.client_addr,
            method: request.method,
            host: request.host,
            request_uri: request.target,
            user_agent: request.user_agent,
            referer: request.referer,
            domain: self.domain,
            rule_index: self.rule_index,
            code: self.code,
            location,
        }
    }
}

/// Everything recorded about a logged request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit<'a> {
    pub remote_addr: &'a str,
    pub method: &'a str,
    pub host: &'a str,
    pub request_uri: &'a str,
    pub user_agent: &'a str,
    pub referer: &'a str,
    pub domain: &'a str,
    pub rule_index: RuleIndex,
    pub code: i64,
    pub location: Option<&'a str>,
}
