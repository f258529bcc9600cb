//! Host and rule matching.
//!
//! # Responsibilities
//! - Match the request host against an origin (exact match, case-insensitive)
//! - Optionally match strict subdomains of the origin
//! - Apply a rule's pattern and replacement to a request-target
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - Ports are part of the origin: `example.com:8080` only matches that port
//! - Request-target matching is case-sensitive and unanchored unless the pattern anchors itself

use crate::config::Rule;

/// Returns true if `host` is served by `origin`.
///
/// With `match_subdomains`, any host ending in `"." + origin` also matches.
/// The origin itself still matches exactly.
pub fn host_matches(origin: &str, match_subdomains: bool, host: &str) -> bool {
    let (host, origin) = (host.as_bytes(), origin.as_bytes());

    if host.eq_ignore_ascii_case(origin) {
        return true;
    }

    if !match_subdomains || host.len() <= origin.len() {
        return false;
    }

    let split = host.len() - origin.len();
    host[split - 1] == b'.' && host[split..].eq_ignore_ascii_case(origin)
}

impl Rule {
    /// Rewrite `target` into a destination URL, if this rule's pattern matches it.
    ///
    /// Every non-overlapping match is replaced; capture references in the
    /// replacement are expanded, `$$` yields a literal `$`.
    pub fn rewrite(&self, target: &str) -> Option<String> {
        if !self.regexp.is_match(target) {
            return None;
        }

        Some(
            self.regexp
                .replace_all(target, self.replacement.as_str())
                .into_owned(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matcher() {
        assert!(host_matches("example.com", false, "example.com"));
        assert!(host_matches("example.com", false, "EXAMPLE.COM")); // Case insensitive
        assert!(!host_matches("example.com", false, "other.com"));
        assert!(!host_matches("example.com", false, "www.example.com"));
        assert!(!host_matches("example.com", false, "example.com:8080"));
        assert!(host_matches("example.com:8080", false, "Example.Com:8080"));
    }

    #[test]
    fn test_subdomain_matcher() {
        assert!(host_matches("example.com", true, "example.com"));
        assert!(host_matches("example.com", true, "www.example.com"));
        assert!(host_matches("example.com", true, "A.B.Example.com"));
        assert!(!host_matches("example.com", true, "www.not-example.com"));
        assert!(!host_matches("example.com", true, "notexample.com"));
        assert!(!host_matches("example.com", true, "com"));
        assert!(!host_matches("example.com", true, "www.example.com:8080"));
        assert!(host_matches("example.com:8080", true, "www.example.com:8080"));
    }

    #[test]
    fn test_non_ascii_host_does_not_panic() {
        assert!(!host_matches("example.com", true, "ü.éxample.com"));
        assert!(!host_matches("example.com", true, "ééééééééééééé"));
    }

    #[test]
    fn test_rewrite_expands_groups() {
        let rule = Rule::new("(.*)", "https://www.example.com$1", 301).unwrap();
        assert_eq!(
            rule.rewrite("/welcome").as_deref(),
            Some("https://www.example.com/welcome")
        );

        let rule = Rule::new("/a(/.*)", "https://a.example.com$1", 303).unwrap();
        assert_eq!(
            rule.rewrite("/a/farewell").as_deref(),
            Some("https://a.example.com/farewell")
        );
        assert_eq!(rule.rewrite("/b/farewell"), None);
    }

    #[test]
    fn test_rewrite_named_and_escaped() {
        let rule = Rule::new(
            r"^/user/(?P<name>\w+)$",
            "https://example.com/$${name}/${name}",
            302,
        )
        .unwrap();
        assert_eq!(
            rule.rewrite("/user/mjec").as_deref(),
            Some("https://example.com/${name}/mjec")
        );
    }

    #[test]
    fn test_rewrite_keeps_query() {
        let rule = Rule::new("^/search(.*)$", "https://search.example.com/q$1", 307).unwrap();
        assert_eq!(
            rule.rewrite("/search?q=rust&page=2").as_deref(),
            Some("https://search.example.com/q?q=rust&page=2")
        );
    }
}
