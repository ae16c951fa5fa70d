//! Prometheus metrics for the watcher.
//!
//! Counters and histograms are atomics shared between clones, so the watcher
//! can record while the `/metrics` handler encodes.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use jira_alert::metrics::Metrics;
//!
//! let metrics = Metrics::new();
//! metrics.observe_query(Duration::from_millis(120), true);
//! metrics.observe_send(Duration::from_millis(40), false);
//!
//! let output = metrics.encode().unwrap();
//! assert!(output.contains("jiraalert_jira_calls_made_total 1"));
//! assert!(output.contains("jiraalert_mattermost_calls_errored_total 1"));
//! ```

use std::sync::Arc;
use std::time::Duration;

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

/// Prometheus client default buckets, in seconds.
const DURATION_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Counters and duration histograms for Jira queries and webhook sends, plus
/// the size of the seen-issue registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    jira_calls_made: Counter,
    jira_calls_errored: Counter,
    jira_request_duration: Histogram,
    webhook_calls_made: Counter,
    webhook_calls_errored: Counter,
    webhook_request_duration: Histogram,
    known_issues: Gauge,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("jira_calls_made", &self.jira_calls_made.get())
            .field("jira_calls_errored", &self.jira_calls_errored.get())
            .field("webhook_calls_made", &self.webhook_calls_made.get())
            .field("webhook_calls_errored", &self.webhook_calls_errored.get())
            .field("known_issues", &self.known_issues.get())
            .finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create the metrics and register them with a fresh registry.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let jira_calls_made = Counter::default();
        registry.register(
            "jiraalert_jira_calls_made",
            "The total number of requests made to the jira api",
            jira_calls_made.clone(),
        );

        let jira_calls_errored = Counter::default();
        registry.register(
            "jiraalert_jira_calls_errored",
            "The total number of requests made to the jira api that resulted in an error",
            jira_calls_errored.clone(),
        );

        let jira_request_duration = Histogram::new(DURATION_BUCKETS.into_iter());
        registry.register(
            "jiraalert_jira_request_duration",
            "The time it took to query the jira api",
            jira_request_duration.clone(),
        );

        let webhook_calls_made = Counter::default();
        registry.register(
            "jiraalert_mattermost_calls_made",
            "The total number of requests made to the mattermost webhook",
            webhook_calls_made.clone(),
        );

        let webhook_calls_errored = Counter::default();
        registry.register(
            "jiraalert_mattermost_calls_errored",
            "The total number of requests made to the mattermost webhook that resulted in an error",
            webhook_calls_errored.clone(),
        );

        let webhook_request_duration = Histogram::new(DURATION_BUCKETS.into_iter());
        registry.register(
            "jiraalert_mattermost_request_duration",
            "The time it took to send the mattermost webhook request",
            webhook_request_duration.clone(),
        );

        let known_issues = Gauge::default();
        registry.register(
            "jiraalert_known_issues",
            "The number of issues already seen in the filter",
            known_issues.clone(),
        );

        Self {
            registry: Arc::new(registry),
            jira_calls_made,
            jira_calls_errored,
            jira_request_duration,
            webhook_calls_made,
            webhook_calls_errored,
            webhook_request_duration,
            known_issues,
        }
    }

    /// Record one Jira query.
    pub fn observe_query(&self, elapsed: Duration, ok: bool) {
        self.jira_request_duration.observe(elapsed.as_secs_f64());
        self.jira_calls_made.inc();
        if !ok {
            self.jira_calls_errored.inc();
        }
    }

    /// Record one webhook send.
    pub fn observe_send(&self, elapsed: Duration, ok: bool) {
        self.webhook_request_duration.observe(elapsed.as_secs_f64());
        self.webhook_calls_made.inc();
        if !ok {
            self.webhook_calls_errored.inc();
        }
    }

    /// Record the current size of the seen-issue registry.
    #[allow(clippy::cast_possible_wrap)]
    pub fn set_known_issues(&self, count: usize) {
        self.known_issues.set(count as i64);
    }

    pub fn known_issues(&self) -> i64 {
        self.known_issues.get()
    }

    pub fn query_attempts(&self) -> u64 {
        self.jira_calls_made.get()
    }

    pub fn query_failures(&self) -> u64 {
        self.jira_calls_errored.get()
    }

    pub fn send_attempts(&self) -> u64 {
        self.webhook_calls_made.get()
    }

    pub fn send_failures(&self) -> u64 {
        self.webhook_calls_errored.get()
    }

    /// Encode all metrics in the OpenMetrics text format.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}
