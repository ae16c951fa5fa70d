//! Chat webhook notifications for jira-alert.
//!
//! This crate sends already formatted alert messages to chat webhooks and
//! reports, for every message, whether delivery worked and how long it took.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use notify::{MattermostChannel, Notifier};
//!
//! # async fn run() -> Result<(), notify::ChannelError> {
//! let channel = MattermostChannel::new(
//!     "https://chat.example.com/hooks/abc",
//!     Duration::from_secs(30),
//! )?;
//! let channels: Vec<Arc<dyn notify::NotifyChannel>> = vec![Arc::new(channel)];
//! let notifier = Notifier::with_channels(channels);
//!
//! let delivery = notifier.send("Disk full on db-1").await;
//! assert!(delivery.is_success());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for notification channels
//! - [`MattermostChannel`] implements Mattermost incoming webhooks
//! - [`Notifier`] sends a message to every enabled channel and times it

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;

pub use channels::mattermost::MattermostChannel;
pub use channels::NotifyChannel;
pub use error::ChannelError;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Outcome of sending one message through the [`Notifier`].
#[derive(Debug)]
pub struct Delivery {
    /// Wall time spent on all channel sends.
    pub elapsed: Duration,
    /// Channels that failed, with their errors.
    pub errors: Vec<(&'static str, ChannelError)>,
}

impl Delivery {
    /// True if no channel reported an error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Central notification dispatcher.
///
/// The `Notifier` owns the configured channels and sends each message to all
/// of them in turn, waiting for every send to finish.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        if channels.is_empty() {
            warn!("No notification channels configured");
        } else {
            info!(
                channel_count = channels.len(),
                "Notification system initialized"
            );
        }

        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier.
    ///
    /// Messages are logged instead of sent and always count as delivered.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Send a message to all enabled channels and wait for the results.
    ///
    /// Errors are logged and returned in the [`Delivery`]; they never panic or
    /// abort the remaining channels.
    pub async fn send(&self, text: &str) -> Delivery {
        let started = Instant::now();

        if self.disabled {
            info!(alert = text, "Notifications disabled, not sending");
            return Delivery {
                elapsed: started.elapsed(),
                errors: vec![],
            };
        }

        let mut errors = vec![];

        for channel in &self.channels {
            let channel_name = channel.name();

            match channel.send(text).await {
                Ok(()) => {
                    debug!(channel = channel_name, "Notification sent");
                }
                Err(e) => {
                    error!(
                        channel = channel_name,
                        error = %e,
                        "Failed to send notification"
                    );
                    errors.push((channel_name, e));
                }
            }
        }

        Delivery {
            elapsed: started.elapsed(),
            errors,
        }
    }
}
