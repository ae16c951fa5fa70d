//! Notification channel implementations.

pub mod mattermost;

use async_trait::async_trait;

use crate::error::ChannelError;

/// Trait for notification channels (Mattermost, etc.).
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Send one already formatted message to this channel.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;
}
