//! Configuration schema definitions.
//!
//! The on-disk shape is decoded in two stages. Rules are first read into
//! [`RawRule`], which holds the pattern as a plain string, and then compiled
//! into [`Rule`]. Everything else deserializes directly. Every struct rejects
//! unknown fields so a typo in the file is an error rather than a silent no-op.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;

/// Header map of a default response. Ordered so responses are reproducible.
pub type Headers = BTreeMap<String, String>;

/// Root configuration for the redirector.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Bind address for the HTTP listener (e.g., ":8080" or "0.0.0.0:8080").
    pub listen_address: String,

    /// Trusted request header carrying the real client address, if any.
    pub client_ip_header: Option<String>,

    /// Fallback used when no domain matches the request host.
    pub default_response: Option<DefaultResponse>,

    /// Origins (`host` or `host:port`) and their rewrite rules.
    pub domains: BTreeMap<String, Domain>,
}

/// Rewrite rules and fallback for one origin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Domain {
    /// Rules tried in order; the first whose pattern matches wins.
    #[serde(rename = "rewrites")]
    pub rewrite_rules: Vec<Rule>,

    /// Overrides the global default when no rule of this domain fires.
    pub default_response: Option<DefaultResponse>,

    /// Also serve strict subdomains of this origin.
    pub match_subdomains: bool,
}

/// A compiled rewrite rule.
///
/// Must stay field-for-field parallel with [`RawRule`].
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct Rule {
    pub regexp: Regex,
    pub replacement: String,
    pub code: i64,
    pub log_hits: bool,
}

/// A rewrite rule as written in the configuration file, pattern not yet compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawRule {
    pub regexp: String,
    pub replacement: String,
    pub code: i64,
    pub log_hits: bool,
}

/// Fixed response served when no rule matches.
///
/// A `code` of 0 means the connection is closed without any response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultResponse {
    pub code: i64,
    pub headers: Headers,
    pub body: String,
    pub log_hits: bool,
}

/// Error produced when a rule pattern fails to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid rule regexp {pattern:?}: {source}")]
pub struct RuleCompileError {
    pattern: String,
    #[source]
    source: regex::Error,
}

impl TryFrom<RawRule> for Rule {
    type Error = RuleCompileError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let RawRule {
            regexp,
            replacement,
            code,
            log_hits,
        } = raw;

        let compiled = Regex::new(&regexp).map_err(|source| RuleCompileError {
            pattern: regexp,
            source,
        })?;

        Ok(Self {
            regexp: compiled,
            replacement,
            code,
            log_hits,
        })
    }
}

impl Rule {
    /// Build a rule from an uncompiled pattern.
    pub fn new(
        regexp: &str,
        replacement: impl Into<String>,
        code: i64,
    ) -> Result<Self, RuleCompileError> {
        Rule::try_from(RawRule {
            regexp: regexp.to_string(),
            replacement: replacement.into(),
            code,
            log_hits: false,
        })
    }
}

impl DefaultResponse {
    /// The response used when the configuration file defines no global default.
    pub fn builtin() -> Self {
        let mut headers = Headers::new();
        headers.insert("Connection".to_string(), "close".to_string());
        headers.insert("Content-Type".to_string(), "text/plain".to_string());

        Self {
            code: 421,
            headers,
            body: "421 Misdirected Request\n\nTarget URI does not match an origin for which the server has been configured.\n".to_string(),
            log_hits: true,
        }
    }

    /// Whether this response means "close the connection, write nothing".
    pub fn closes_connection(&self) -> bool {
        self.code == 0
    }
}

impl Config {
    /// Fill in the built-in default response if the file defined none.
    pub fn with_builtin_default(mut self) -> Self {
        if self.default_response.is_none() {
            self.default_response = Some(DefaultResponse::builtin());
        }
        self
    }
}
