//! Error types for jira-alert.

use thiserror::Error;

/// Errors returned by the Jira REST client.
#[derive(Debug, Error)]
pub enum JiraError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Jira answered with a non-success status.
    #[error("Jira API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Failed to decode Jira response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Invalid settings detected after parsing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A URL setting uses a scheme other than http or https.
    #[error("{key} must be an http(s) URL, got scheme '{scheme}'")]
    UnsupportedScheme { key: &'static str, scheme: String },

    /// The `.env` file exists but could not be read.
    #[error("Failed to load .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),
}
