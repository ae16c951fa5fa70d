//! Runtime settings.
//!
//! Every setting can be given as a command-line flag or through the
//! environment. A `.env` file in the working directory is loaded first when
//! present, so deployments can keep using the same file they always had.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, ValueEnum};
use tracing::info;
use url::Url;

use crate::error::ConfigError;
use crate::watcher::WatcherConfig;

/// Default outbound HTTP timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Longest accepted check interval (one year), in seconds.
pub const MAX_CHECK_INTERVAL_SECS: u64 = 31_536_000;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human readable.
    Text,
}

/// Watches a Jira filter and posts new issues to a chat webhook.
#[derive(Clone, Parser)]
#[command(name = "jira-alert")]
#[command(version)]
pub struct Settings {
    /// Jira base URL
    #[arg(long, env = "JIRA_URL")]
    pub jira_url: Url,

    /// Jira user for basic authentication
    #[arg(long, env = "JIRA_USERNAME")]
    pub jira_username: String,

    /// Jira password or API token
    #[arg(long, env = "JIRA_PASSWORD", hide_env_values = true)]
    pub jira_password: String,

    /// Id of the saved filter to watch
    #[arg(long, env = "JIRA_FILTER_ID")]
    pub jira_filter_id: u64,

    /// Seconds between two filter checks
    #[arg(
        long,
        env = "JIRA_CHECK_INTERVAL",
        value_parser = clap::value_parser!(u64).range(1..=MAX_CHECK_INTERVAL_SECS)
    )]
    pub jira_check_interval: u64,

    /// Incoming webhook receiving the alerts
    #[arg(long, env = "WEBHOOK_URL", hide_env_values = true)]
    pub webhook_url: Url,

    /// Port of the metrics endpoint
    #[arg(long, env = "PROMETHEUS_PORT")]
    pub prometheus_port: u16,

    /// Address the metrics endpoint binds to
    #[arg(long, env = "METRICS_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub metrics_bind: IpAddr,

    /// Mark issues open at startup as known without posting them
    #[arg(
        long = "no-initial-post",
        alias = "NoInitialPost",
        env = "NO_INITIAL_POST",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub no_initial_post: bool,

    /// Priorities that are tracked but never posted (comma separated)
    #[arg(long, env = "ALERT_EXCLUDED_PRIORITIES", value_delimiter = ',')]
    pub excluded_priorities: Vec<String>,

    /// Timeout for Jira and webhook requests, in seconds
    #[arg(
        long,
        env = "HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub http_timeout_secs: u64,

    /// Log alerts instead of posting them
    #[arg(
        long,
        env = "NOTIFY_DISABLED",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub notify_disabled: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("jira_url", &self.jira_url.as_str())
            .field("jira_username", &self.jira_username)
            .field("jira_password", &"<redacted>")
            .field("jira_filter_id", &self.jira_filter_id)
            .field("jira_check_interval", &self.jira_check_interval)
            .field("webhook_url", &"<redacted>")
            .field("prometheus_port", &self.prometheus_port)
            .field("metrics_bind", &self.metrics_bind)
            .field("no_initial_post", &self.no_initial_post)
            .field("excluded_priorities", &self.excluded_priorities)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("notify_disabled", &self.notify_disabled)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Settings {
    /// Load `.env` (if any), then parse flags and environment.
    ///
    /// Exits the process with a usage message when a required value is
    /// missing or malformed. Returns whether a `.env` file was loaded.
    pub fn load() -> Result<(Self, bool), ConfigError> {
        let dotenv_loaded = match dotenvy::dotenv() {
            Ok(_) => true,
            Err(e) if e.not_found() => false,
            Err(e) => return Err(e.into()),
        };

        let settings = Self::parse().validated()?;
        Ok((settings, dotenv_loaded))
    }

    /// Check constraints clap cannot express and normalise list values.
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        check_http_scheme("JIRA_URL", &self.jira_url)?;
        check_http_scheme("WEBHOOK_URL", &self.webhook_url)?;

        self.excluded_priorities = self
            .excluded_priorities
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(self)
    }

    /// Log every setting, secrets excluded.
    pub fn log_summary(&self) {
        info!(
            jira_url = %self.jira_url,
            jira_username = %self.jira_username,
            jira_filter_id = self.jira_filter_id,
            jira_check_interval = self.jira_check_interval,
            prometheus_port = self.prometheus_port,
            metrics_bind = %self.metrics_bind,
            initial_post = !self.no_initial_post,
            excluded_priorities = ?self.excluded_priorities,
            http_timeout_secs = self.http_timeout_secs,
            notify_disabled = self.notify_disabled,
            "Loaded configuration"
        );
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.jira_check_interval)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn metrics_addr(&self) -> SocketAddr {
        SocketAddr::new(self.metrics_bind, self.prometheus_port)
    }

    /// Derive the watcher's configuration.
    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            interval: self.check_interval(),
            initial_post: !self.no_initial_post,
            jira_url: self.jira_url.as_str().trim_end_matches('/').to_string(),
            excluded_priorities: self.excluded_priorities.clone(),
        }
    }
}

fn check_http_scheme(key: &'static str, url: &Url) -> Result<(), ConfigError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::UnsupportedScheme {
            key,
            scheme: other.to_string(),
        }),
    }
}
