//! Jira filter watcher.
//!
//! This crate provides:
//! - A Jira REST client that resolves a saved filter and runs its JQL
//! - A watcher that posts every newly matching issue to a chat webhook
//! - Prometheus metrics for Jira queries and webhook sends, served over HTTP

pub mod alert;
pub mod config;
pub mod error;
pub mod jira;
pub mod metrics;
pub mod registry;
pub mod server;
pub mod watcher;

// Re-export main types
pub use config::{LogFormat, Settings};
pub use error::{ConfigError, JiraError};
pub use jira::{Filter, Issue, IssueSource, JiraClient};
pub use metrics::Metrics;
pub use registry::SeenIssueRegistry;
pub use watcher::{CycleReport, Watcher, WatcherConfig};
