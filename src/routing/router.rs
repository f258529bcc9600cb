//! Per-request decision.
//!
//! # Responsibilities
//! - Find the one domain serving the request host
//! - Scan its rules in declaration order, first match wins
//! - Fall back to the domain default, then the global default
//! - Label the result for logging and metrics
//!
//! # Design Decisions
//! - Pure function of (config, request): no I/O, no locks, no allocation beyond the destination URL
//! - Ambiguous host matches are rejected by validation; here the first domain in key order wins
//! - No global default at all means Close, the same as a default with code 0
//!
//! ```text
//! START → DOMAIN_LOOKUP ─┬─ domain → RULE_SCAN ─┬─ match → REDIRECT
//!                        │                      └─ exhausted → DEFAULT_RESOLUTION
//!                        └─ no domain ────────────────────────→ DEFAULT_RESOLUTION
//! DEFAULT_RESOLUTION → FIXED (code != 0) | CLOSE (code == 0 or no default)
//! ```

use crate::config::{Config, DefaultResponse, Domain};
use crate::routing::matcher::host_matches;
use crate::routing::outcome::{Decision, Outcome, RequestFacts, RuleIndex, DEFAULT_LABEL};

/// Decide what to do with one request.
pub fn decide<'a>(config: &'a Config, request: &RequestFacts<'_>) -> Decision<'a> {
    let mut fallback = (DEFAULT_LABEL, config.default_response.as_ref());

    if let Some((origin, domain)) = find_domain(config, request.host) {
        for (index, rule) in domain.rewrite_rules.iter().enumerate() {
            if let Some(location) = rule.rewrite(request.target) {
                return Decision {
                    outcome: Outcome::Redirect { location },
                    domain: origin,
                    rule_index: RuleIndex::Rule(index),
                    code: rule.code,
                    log_hits: rule.log_hits,
                };
            }
        }

        if let Some(default_response) = &domain.default_response {
            fallback = (origin, Some(default_response));
        }
    }

    resolve_default(fallback.0, fallback.1)
}

/// The domain serving `host`, with its origin key.
pub fn find_domain<'a>(config: &'a Config, host: &str) -> Option<(&'a str, &'a Domain)> {
    config
        .domains
        .iter()
        .find(|(origin, domain)| host_matches(origin, domain.match_subdomains, host))
        .map(|(origin, domain)| (origin.as_str(), domain))
}

fn resolve_default<'a>(
    label: &'a str,
    default_response: Option<&'a DefaultResponse>,
) -> Decision<'a> {
    match default_response {
        Some(response) if !response.closes_connection() => Decision {
            outcome: Outcome::Fixed(response),
            domain: label,
            rule_index: RuleIndex::Default,
            code: response.code,
            log_hits: response.log_hits,
        },
        Some(response) => Decision {
            outcome: Outcome::Close,
            domain: label,
            rule_index: RuleIndex::Default,
            code: 0,
            log_hits: response.log_hits,
        },
        None => Decision {
            outcome: Outcome::Close,
            domain: label,
            rule_index: RuleIndex::Default,
            code: 0,
            log_hits: false,
        },
    }
}
