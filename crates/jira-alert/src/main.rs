//! jira-alert - posts new issues of a Jira filter to a chat webhook.

use std::sync::Arc;

use anyhow::{Context, Result};
use jira_alert::{server, JiraClient, LogFormat, Metrics, Settings, Watcher};
use notify::{MattermostChannel, Notifier, NotifyChannel};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "jira_alert=info,notify=info,warn";

#[tokio::main]
async fn main() -> Result<()> {
    let (settings, dotenv_loaded) = Settings::load().context("Invalid configuration")?;

    init_tracing(settings.log_format);

    info!("Initialize application");
    if dotenv_loaded {
        info!("Loaded settings from .env file");
    }
    settings.log_summary();

    let jira = JiraClient::new(
        settings.jira_url.as_str(),
        settings.jira_username.clone(),
        settings.jira_password.clone(),
        settings.http_timeout(),
    )
    .context("Failed to create Jira client")?;

    let filter = jira
        .get_filter(settings.jira_filter_id)
        .await
        .with_context(|| format!("Failed to load Jira filter {}", settings.jira_filter_id))?;
    info!(filter_id = %filter.id, filter = %filter.name, jql = %filter.jql, "Using filter");

    let notifier = if settings.notify_disabled {
        warn!("NOTIFY_DISABLED set, alerts will only be logged");
        Notifier::disabled()
    } else {
        let channel = MattermostChannel::new(settings.webhook_url.as_str(), settings.http_timeout())
            .context("Failed to create webhook channel")?;
        let channels: Vec<Arc<dyn NotifyChannel>> = vec![Arc::new(channel)];
        Notifier::with_channels(channels)
    };
    info!(
        channels = notifier.channel_count(),
        posting = notifier.has_channels(),
        "Notifier ready"
    );

    let metrics = Metrics::new();
    let shutdown = CancellationToken::new();

    info!("Start watcher");
    let watcher = Watcher::new(
        settings.watcher_config(),
        filter.jql,
        Arc::new(jira),
        notifier,
        metrics.clone(),
    );
    let mut watcher_handle = tokio::spawn(watcher.run(shutdown.clone()));

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    info!("Starting monitoring");
    let metrics_addr = settings.metrics_addr();
    let mut server_handle = tokio::spawn(server::serve(metrics_addr, metrics, shutdown.clone()));

    // Whichever task ends first takes the other one down with it.
    let stop_all = |shutdown: &CancellationToken, task: &str| {
        let requested = shutdown.is_cancelled();
        if !requested {
            error!(task, "Task stopped unexpectedly, shutting down");
        }
        shutdown.cancel();
        requested
    };
    let (requested, watcher_result, server_result) = tokio::select! {
        joined = &mut watcher_handle => {
            let requested = stop_all(&shutdown, "watcher");
            (requested, joined, server_handle.await)
        }
        joined = &mut server_handle => {
            let requested = stop_all(&shutdown, "metrics server");
            (requested, watcher_handle.await, joined)
        }
    };

    watcher_result.context("Watcher task panicked")?;
    server_result
        .context("Metrics server task panicked")?
        .with_context(|| format!("Metrics server on {metrics_addr} failed"))?;
    if !requested {
        anyhow::bail!("Stopped without a shutdown request");
    }
    info!("jira-alert stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
