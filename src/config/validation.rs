//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic, including regex compilation)
//! - Origin keys are lowercase FQDNs, optionally with a port
//! - Redirect codes in 300..=399, default response codes 0 or 200..=599
//! - Replacements are absolute http(s) URLs whose group references exist
//! - No origin hides under another origin that matches subdomains
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: &Config → Vec<ValidationError>
//! - Output order is deterministic for a given config (domains are an ordered map)

use std::sync::LazyLock;

use regex::Regex;

use crate::config::schema::{Config, DefaultResponse, Domain, Rule};

static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?::\d+)?$",
    )
    .expect("domain pattern is valid")
});

// `$name`, `$0`, `${name}`, `${0}`: the reference forms understood by `Regex::replace_all`.
static GROUP_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([^}]+)\}|([0-9A-Za-z_]+))").expect("group reference pattern is valid")
});

/// A single configuration problem, phrased for the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid domain {origin}. Keys must be valid fully qualified DNS domain names in ASCII lowercase (in punycode if required), optionally including a port number.")]
    InvalidDomain { origin: String },

    #[error("Invalid redirect code {code} for domain {origin} at index {index}. Code must be between 300 and 399 inclusive.")]
    InvalidRedirectCode {
        origin: String,
        index: usize,
        code: i64,
    },

    #[error("Invalid replacement for domain {origin} at index {index}. Destination must begin with 'http://' or 'https://'.")]
    InvalidReplacementScheme { origin: String, index: usize },

    #[error("Invalid replacement '{replacement}' for domain {origin} at index {index}: replacement group ${group} does not exist")]
    MissingGroup {
        origin: String,
        index: usize,
        replacement: String,
        group: String,
    },

    #[error("Domain {origin} has match_subdomains set to true, which makes the definition of subdomain {subdomain} prohibited")]
    ShadowedSubdomain { origin: String, subdomain: String },

    #[error("Invalid default response code {code} for {scope}. Code must be between 200 and 599 inclusive, or 0 to close the connection immediately.")]
    InvalidDefaultCode { scope: String, code: i64 },
}

/// Validate a whole configuration, collecting every problem found.
pub fn validate(config: &Config) -> Vec<ValidationError> {
    let mut problems = Vec::new();

    for (origin, domain) in &config.domains {
        problems.extend(validate_domain(origin, domain));
    }

    // Cross-domain pass: needs every origin, so it runs after the per-domain checks.
    for (origin, domain) in &config.domains {
        if !domain.match_subdomains {
            continue;
        }
        let suffix = format!(".{}", origin.to_lowercase());
        for candidate in config.domains.keys() {
            if candidate.to_lowercase().ends_with(&suffix) {
                problems.push(ValidationError::ShadowedSubdomain {
                    origin: origin.clone(),
                    subdomain: candidate.clone(),
                });
            }
        }
    }

    if let Some(default_response) = &config.default_response {
        problems.extend(validate_default_response("the global default", default_response));
    }

    problems
}

fn validate_domain(origin: &str, domain: &Domain) -> Vec<ValidationError> {
    let mut problems = Vec::new();

    if !DOMAIN_RE.is_match(origin) {
        problems.push(ValidationError::InvalidDomain {
            origin: origin.to_string(),
        });
    }

    for (index, rule) in domain.rewrite_rules.iter().enumerate() {
        problems.extend(validate_rule(origin, index, rule));
    }

    if let Some(default_response) = &domain.default_response {
        problems.extend(validate_default_response(
            &format!("domain {origin}"),
            default_response,
        ));
    }

    problems
}

fn validate_default_response(
    scope: &str,
    default_response: &DefaultResponse,
) -> Vec<ValidationError> {
    let code = default_response.code;
    if code == 0 || (200..=599).contains(&code) {
        return Vec::new();
    }

    vec![ValidationError::InvalidDefaultCode {
        scope: scope.to_string(),
        code,
    }]
}

fn validate_rule(origin: &str, index: usize, rule: &Rule) -> Vec<ValidationError> {
    let mut problems = Vec::new();

    if !(300..=399).contains(&rule.code) {
        problems.push(ValidationError::InvalidRedirectCode {
            origin: origin.to_string(),
            index,
            code: rule.code,
        });
    }

    if !rule.replacement.starts_with("http://") && !rule.replacement.starts_with("https://") {
        problems.push(ValidationError::InvalidReplacementScheme {
            origin: origin.to_string(),
            index,
        });
    }

    for group in missing_groups(&rule.regexp, &rule.replacement) {
        problems.push(ValidationError::MissingGroup {
            origin: origin.to_string(),
            index,
            replacement: rule.replacement.clone(),
            group,
        });
    }

    problems
}

/// Group references in `replacement` that `regexp` cannot satisfy.
fn missing_groups(regexp: &Regex, replacement: &str) -> Vec<String> {
    // "$$" is a literal dollar sign and never starts a reference.
    let unescaped = replacement.replace("$$", "");

    GROUP_REF_RE
        .captures_iter(&unescaped)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .filter(|group| !group_exists(regexp, group))
        .map(str::to_string)
        .collect()
}

fn group_exists(regexp: &Regex, group: &str) -> bool {
    if group.bytes().all(|b| b.is_ascii_digit()) {
        // Group 0 is the whole match and always exists.
        return group
            .parse::<usize>()
            .map(|index| index < regexp.captures_len())
            .unwrap_or(false);
    }

    regexp.capture_names().flatten().any(|name| name == group)
}
