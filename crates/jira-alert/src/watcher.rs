//! The polling loop: query the filter, find new issues, post them.
//!
//! One [`Watcher`] owns the seen-issue registry and the first-run suppression
//! flag. Cycles run strictly one after another on a single task, so neither
//! needs locking.
//!
//! Delivery is at-most-once: an issue is marked seen before its alert is sent,
//! and a failed send is logged and counted but never retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::Notifier;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::alert::alert_for;
use crate::jira::{Issue, IssueSource};
use crate::metrics::Metrics;
use crate::registry::SeenIssueRegistry;

/// Watcher behaviour, derived from the settings at startup.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Time between two cycles.
    pub interval: Duration,
    /// Post issues found by the first cycle. When false they are only marked seen.
    pub initial_post: bool,
    /// Jira base URL without trailing slash, used for browse links.
    pub jira_url: String,
    /// Priority names (case-insensitive) that are marked seen but never posted.
    pub excluded_priorities: Vec<String>,
}

impl WatcherConfig {
    fn is_excluded(&self, priority: &str) -> bool {
        self.excluded_priorities
            .iter()
            .any(|p| p.eq_ignore_ascii_case(priority))
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// The Jira query failed; nothing else happened.
    pub query_failed: bool,
    /// Issues returned by the query.
    pub fetched: usize,
    /// Issues not seen before this cycle.
    pub new: usize,
    /// New issues only marked seen because of first-run suppression.
    pub suppressed: usize,
    /// New issues only marked seen because their priority is excluded.
    pub filtered: usize,
    /// Alerts delivered.
    pub sent: usize,
    /// Alerts that failed to deliver.
    pub failed: usize,
}

/// Polls an [`IssueSource`] and posts every newly seen issue.
pub struct Watcher {
    config: WatcherConfig,
    jql: String,
    source: Arc<dyn IssueSource>,
    notifier: Notifier,
    metrics: Metrics,
    registry: SeenIssueRegistry,
    /// Set until the first successful query when `initial_post` is off.
    suppress_alerts: bool,
}

impl Watcher {
    pub fn new(
        config: WatcherConfig,
        jql: impl Into<String>,
        source: Arc<dyn IssueSource>,
        notifier: Notifier,
        metrics: Metrics,
    ) -> Self {
        let suppress_alerts = !config.initial_post;
        Self {
            config,
            jql: jql.into(),
            source,
            notifier,
            metrics,
            registry: SeenIssueRegistry::new(),
            suppress_alerts,
        }
    }

    pub fn registry(&self) -> &SeenIssueRegistry {
        &self.registry
    }

    /// True while the next successful cycle will mark issues seen without posting.
    pub fn is_suppressing(&self) -> bool {
        self.suppress_alerts
    }

    /// Run cycles every `interval` until `shutdown` is cancelled.
    ///
    /// The first cycle starts one interval after the call. Cancellation is
    /// only observed between cycles; a running cycle always completes. A
    /// cycle that overruns the interval delays the next tick instead of
    /// causing a burst of catch-up cycles.
    pub async fn run(mut self, shutdown: CancellationToken) {
        let period = self.config.interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = period.as_secs(),
            suppressing = self.suppress_alerts,
            "Watcher started"
        );

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let report = self.run_cycle().await;
            debug!(?report, "Cycle finished");
        }

        info!(known_issues = self.registry.len(), "Watcher stopped");
    }

    /// Execute one poll cycle. Failures are logged and counted, never returned.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        let started = Instant::now();
        let result = self.source.search(&self.jql).await;
        self.metrics.observe_query(started.elapsed(), result.is_ok());

        let issues = match result {
            Ok(issues) => issues,
            Err(e) => {
                error!(error = %e, "Jira query failed");
                report.query_failed = true;
                return report;
            }
        };
        report.fetched = issues.len();

        let known_before = self.registry.len();
        let alerts = self.reconcile(issues, &mut report);
        self.metrics.set_known_issues(self.registry.len());

        if self.registry.len() != known_before {
            info!(known_issues = self.registry.len(), "Number of known issues changed");
        }

        for issue in &alerts {
            if self.dispatch(issue).await {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
        }

        report
    }

    /// Mark every unseen issue as seen and return the ones to post, in source order.
    fn reconcile(&mut self, issues: Vec<Issue>, report: &mut CycleReport) -> Vec<Issue> {
        let mut alerts = Vec::new();

        for issue in issues {
            if !self.registry.insert(&issue.key) {
                continue;
            }
            report.new += 1;

            if self.suppress_alerts {
                report.suppressed += 1;
            } else if self.config.is_excluded(&issue.priority) {
                debug!(key = %issue.key, priority = %issue.priority, "Priority excluded, not posting");
                report.filtered += 1;
            } else {
                alerts.push(issue);
            }
        }

        if self.suppress_alerts {
            info!(
                marked = report.suppressed,
                "Initial issues marked as known without posting"
            );
            self.suppress_alerts = false;
        }

        alerts
    }

    async fn dispatch(&self, issue: &Issue) -> bool {
        let message = alert_for(issue, &self.config.jira_url);
        let delivery = self.notifier.send(&message).await;
        let ok = delivery.is_success();
        self.metrics.observe_send(delivery.elapsed, ok);

        if ok {
            info!(key = %issue.key, priority = %issue.priority, "Posted new issue");
        } else {
            warn!(
                key = %issue.key,
                failed_channels = delivery.errors.len(),
                "Failed to post new issue, not retrying"
            );
        }

        ok
    }
}
