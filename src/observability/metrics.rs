//! Metrics collection and exposition.
//!
//! # Metrics
//! - `in_flight_requests` (gauge): requests currently being served
//! - `requests_total` (counter): requests by domain, rule_index, method, code
//! - `request_duration_seconds` (histogram): latency by the same labels
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations behind the `metrics` facade)
//! - Labels come straight from the engine's Decision
//! - Without an installed exporter every update is a no-op

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{describe_counter, describe_gauge, describe_histogram, Label};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Decision;

pub const IN_FLIGHT_REQUESTS: &str = "in_flight_requests";
pub const REQUESTS_TOTAL: &str = "requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "request_duration_seconds";

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_gauge!(IN_FLIGHT_REQUESTS, "A gauge of requests currently being served");
    describe_counter!(REQUESTS_TOTAL, "A counter for requests");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "A histogram of latencies for requests"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Label value for a request method.
///
/// Clients may send any token as a method; everything outside the standard
/// set shares one series so the label stays bounded.
pub fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "CONNECT" => "CONNECT",
        "OPTIONS" => "OPTIONS",
        "TRACE" => "TRACE",
        "PATCH" => "PATCH",
        _ => "other",
    }
}

/// Labels identifying how a request was answered.
pub fn request_labels(decision: &Decision<'_>, method: &str) -> Vec<Label> {
    vec![
        Label::new("domain", decision.domain.to_string()),
        Label::new("rule_index", decision.rule_index.to_string()),
        Label::new("method", method_label(method)),
        Label::new("code", decision.code.to_string()),
    ]
}

/// Count a finished request and record how long it took.
pub fn record_request(decision: &Decision<'_>, method: &str, start_time: Instant) {
    let labels = request_labels(decision, method);
    let elapsed = start_time.elapsed().as_secs_f64();

    metrics::counter!(REQUESTS_TOTAL, labels.clone()).increment(1);
    metrics::histogram!(REQUEST_DURATION_SECONDS, labels).record(elapsed);
}

/// Counts a request as in flight until dropped.
#[derive(Debug)]
pub struct InFlightGuard(());

impl InFlightGuard {
    pub fn start() -> Self {
        metrics::gauge!(IN_FLIGHT_REQUESTS).increment(1.0);
        Self(())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        metrics::gauge!(IN_FLIGHT_REQUESTS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{Outcome, RuleIndex, DEFAULT_LABEL};

    #[test]
    fn labels_follow_the_decision() {
        let decision = Decision {
            outcome: Outcome::Close,
            domain: DEFAULT_LABEL,
            rule_index: RuleIndex::Default,
            code: 0,
            log_hits: false,
        };

        let labels: Vec<(String, String)> = request_labels(&decision, "GET")
            .iter()
            .map(|label| (label.key().to_string(), label.value().to_string()))
            .collect();

        assert_eq!(
            labels,
            vec![
                ("domain".to_string(), "default".to_string()),
                ("rule_index".to_string(), "default".to_string()),
                ("method".to_string(), "GET".to_string()),
                ("code".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn recording_without_exporter_is_harmless() {
        let decision = Decision {
            outcome: Outcome::Redirect {
                location: "https://example.com/".to_string(),
            },
            domain: "example.com",
            rule_index: RuleIndex::Rule(2),
            code: 301,
            log_hits: true,
        };

        let _guard = InFlightGuard::start();
        record_request(&decision, "HEAD", Instant::now());
    }

    #[test]
    fn method_label_is_bounded() {
        let standard = [
            "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
        ];
        for method in standard {
            assert_eq!(method_label(method), method);
        }
        assert_eq!(method_label("get"), "other");
        assert_eq!(method_label("PROPFIND"), "other");
        assert_eq!(method_label("X42"), "other");
    }

    #[test]
    fn arbitrary_methods_share_one_series() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let decision = Decision {
            outcome: Outcome::Close,
            domain: DEFAULT_LABEL,
            rule_index: RuleIndex::Default,
            code: 0,
            log_hits: false,
        };

        metrics::with_local_recorder(&recorder, || {
            for i in 0..100 {
                record_request(&decision, &format!("X{i}"), Instant::now());
            }
            record_request(&decision, "GET", Instant::now());
        });

        let rendered = handle.render();
        let series: Vec<&str> = rendered
            .lines()
            .filter(|line| line.starts_with(REQUESTS_TOTAL) && line.contains('{'))
            .collect();
        assert_eq!(series.len(), 2, "{rendered}");
        let count = |method: &str| {
            series
                .iter()
                .find(|line| line.contains(&format!("method=\"{method}\"")))
                .and_then(|line| line.rsplit(' ').next())
                .map(str::to_string)
        };
        assert_eq!(count("other").as_deref(), Some("100"));
        assert_eq!(count("GET").as_deref(), Some("1"));
    }
}
