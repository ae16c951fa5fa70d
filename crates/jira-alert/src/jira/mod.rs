//! Jira issue source.
//!
//! The watcher only depends on the [`IssueSource`] trait; [`JiraClient`] is the
//! production implementation talking to the Jira REST API v2.

mod client;
mod models;

pub use client::JiraClient;

use async_trait::async_trait;

use crate::error::JiraError;

/// Priority label used for issues that have no priority set.
pub const NO_PRIORITY: &str = "None";

/// An issue returned by a filter query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    /// Issue key, e.g. `OPS-12`. Unique per Jira instance.
    pub key: String,
    /// Priority display name.
    pub priority: String,
    /// Summary line.
    pub summary: String,
}

impl Issue {
    /// Convenience constructor.
    pub fn new(
        key: impl Into<String>,
        priority: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            priority: priority.into(),
            summary: summary.into(),
        }
    }
}

/// A saved Jira filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub id: String,
    pub name: String,
    pub jql: String,
}

/// Something that can answer "which issues match this JQL right now".
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Run `jql` and return every matching issue in source order.
    async fn search(&self, jql: &str) -> Result<Vec<Issue>, JiraError>;
}
