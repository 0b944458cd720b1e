//! Notification sinks.

use async_trait::async_trait;
use tracing::info;

use super::{DeliveryError, Notification, NotificationSink};

/// Sink that only writes notifications to the log.
///
/// Used when no webhook is configured.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if notification.pages.is_empty() {
            return Err(DeliveryError::Empty);
        }
        for (i, page) in notification.rendered().iter().enumerate() {
            info!(
                target: "restock_sentinel::notification",
                title = %notification.title,
                page = i + 1,
                pages = notification.page_count(),
                "{}",
                page.text
            );
        }
        Ok(())
    }
}

#[cfg(feature = "http")]
pub use webhook::WebhookSink;

#[cfg(feature = "http")]
mod webhook {
    use async_trait::async_trait;
    use serde::Serialize;

    use crate::notify::{DeliveryError, Notification, NotificationSink, RenderedPage};

    #[derive(Serialize)]
    struct Payload<'a> {
        title: &'a str,
        pages: Vec<RenderedPage>,
    }

    /// Sink posting the notification as JSON to a webhook.
    ///
    /// Body: `{"title": ..., "pages": [{"text": ..., "footer": ...}]}`.
    /// Any non-2xx response is a failed delivery.
    #[derive(Debug, Clone)]
    pub struct WebhookSink {
        url: String,
        client: reqwest::Client,
    }

    impl WebhookSink {
        /// Create a sink posting to `url`.
        pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
            Self {
                url: url.into(),
                client,
            }
        }
    }

    pub(crate) async fn post_json<T: Serialize + Sync>(
        client: &reqwest::Client,
        url: &str,
        body: &T,
    ) -> Result<(), DeliveryError> {
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let mut body = response.text().await.unwrap_or_default();
        body.truncate(body.char_indices().nth(200).map_or(body.len(), |(i, _)| i));
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    #[async_trait]
    impl NotificationSink for WebhookSink {
        async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
            if notification.pages.is_empty() {
                return Err(DeliveryError::Empty);
            }
            let payload = Payload {
                title: &notification.title,
                pages: notification.rendered(),
            };
            post_json(&self.client, &self.url, &payload).await
        }
    }
}

#[cfg(feature = "http")]
pub(crate) use webhook::post_json;
