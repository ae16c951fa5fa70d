//! Mattermost incoming-webhook notification channel.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::NotifyChannel;

/// Mattermost incoming-webhook channel.
///
/// Any service that accepts the Mattermost `{"text": "..."}` payload
/// (Mattermost, Rocket.Chat, Slack-compatible endpoints) works here.
pub struct MattermostChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl MattermostChannel {
    /// Create a channel posting to `webhook_url`, with every request bounded by `timeout`.
    ///
    /// # Errors
    /// Returns an error if the URL is empty or the HTTP client cannot be built.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        let webhook_url = webhook_url.into();
        if webhook_url.trim().is_empty() {
            return Err(ChannelError::NotConfigured("webhook URL".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

#[async_trait]
impl NotifyChannel for MattermostChannel {
    fn name(&self) -> &'static str {
        "mattermost"
    }

    async fn send(&self, text: &str) -> Result<(), ChannelError> {
        debug!(channel = "mattermost", "Sending notification");

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&MattermostPayload { text })
            .send()
            .await?;

        if response.status().is_success() {
            debug!(channel = "mattermost", "Notification sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            warn!(
                channel = "mattermost",
                status = %status,
                body = %body,
                "Mattermost webhook request failed"
            );

            Err(ChannelError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[derive(Debug, Serialize)]
struct MattermostPayload<'a> {
    text: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn channel_for(server: &MockServer) -> MattermostChannel {
        MattermostChannel::new(format!("{}/hooks/abc", server.uri()), Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_empty_url_is_not_configured() {
        let result = MattermostChannel::new("  ", Duration::from_secs(5));
        assert!(matches!(result, Err(ChannelError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_posts_text_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/abc"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({ "text": "hello" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        channel_for(&server).send("hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
            .mount(&server)
            .await;

        let err = channel_for(&server).send("hello").await.unwrap_err();
        match err {
            ChannelError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad payload");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
