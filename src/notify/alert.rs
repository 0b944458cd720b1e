//! Best-effort out-of-band alerts to the operator.
//!
//! Used when a background loop hits an unexpected error. Alert delivery
//! can fail; that failure is logged and otherwise ignored.

use async_trait::async_trait;
use tracing::{error, warn};

use super::DeliveryError;

/// Longest alert message sent, in characters.
pub const MAX_ALERT_CHARS: usize = 1900;

/// Out-of-band channel to whoever runs the process.
#[async_trait]
pub trait OperatorAlert: Send + Sync {
    /// Send `message` to the operator.
    async fn alert(&self, message: &str) -> Result<(), DeliveryError>;
}

/// Alert that only logs at error level.
#[derive(Debug, Clone, Default)]
pub struct LogAlert;

#[async_trait]
impl OperatorAlert for LogAlert {
    async fn alert(&self, message: &str) -> Result<(), DeliveryError> {
        error!(target: "restock_sentinel::operator", "{}", message);
        Ok(())
    }
}

/// Send an alert, truncated to [`MAX_ALERT_CHARS`]. Never fails.
///
/// Returns whether the alert was delivered.
pub async fn alert_operator(alert: &dyn OperatorAlert, message: &str) -> bool {
    let message = truncate_chars(message, MAX_ALERT_CHARS);
    match alert.alert(message).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Failed to alert operator");
            false
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(feature = "http")]
pub use webhook::WebhookAlert;

#[cfg(feature = "http")]
mod webhook {
    use async_trait::async_trait;
    use serde::Serialize;

    use super::OperatorAlert;
    use crate::notify::sink::post_json;
    use crate::notify::DeliveryError;

    #[derive(Serialize)]
    struct Payload<'a> {
        content: &'a str,
    }

    /// Alert posted as `{"content": ...}` to a webhook.
    #[derive(Debug, Clone)]
    pub struct WebhookAlert {
        url: String,
        client: reqwest::Client,
    }

    impl WebhookAlert {
        /// Create an alert posting to `url`.
        pub fn new(url: impl Into<String>, client: reqwest::Client) -> Self {
            Self {
                url: url.into(),
                client,
            }
        }
    }

    #[async_trait]
    impl OperatorAlert for WebhookAlert {
        async fn alert(&self, message: &str) -> Result<(), DeliveryError> {
            post_json(&self.client, &self.url, &Payload { content: message }).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl OperatorAlert for Recording {
        async fn alert(&self, message: &str) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Transport("offline".to_string()));
            }
            self.sent.lock().push(message.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_long_messages_are_truncated() {
        let alert = Recording::default();
        let long = "é".repeat(MAX_ALERT_CHARS + 50);

        assert!(alert_operator(&alert, &long).await);
        assert_eq!(alert.sent.lock()[0].chars().count(), MAX_ALERT_CHARS);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let alert = Recording {
            fail: true,
            ..Default::default()
        };
        assert!(!alert_operator(&alert, "boom").await);
    }
}
