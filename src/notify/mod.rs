//! Notification building and delivery.
//!
//! ## Architecture
//!
//! ```text
//! newly available → restock_lines → paginate → Notification → NotificationSink
//! ```
//!
//! Sinks receive the complete, already paginated notification. How pages
//! are shown and flipped through is up to the sink.

pub mod alert;
pub mod format;
pub mod pager;
pub mod sink;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::LatestObservations;

pub use alert::{alert_operator, LogAlert, OperatorAlert, MAX_ALERT_CHARS};
pub use format::{restock_caption, restock_lines, RESTOCK_TITLE};
pub use pager::{paginate, Page, PageLimits, MIN_PAGE_LINES};
pub use sink::LogSink;
#[cfg(feature = "http")]
pub use alert::WebhookAlert;
#[cfg(feature = "http")]
pub use sink::WebhookSink;

/// Error returned by a sink or operator alert.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// Could not reach the destination.
    #[error("Delivery transport failed: {0}")]
    Transport(String),
    /// Destination answered with a failure.
    #[error("Delivery rejected with status {status}: {body}")]
    Rejected {
        /// Response status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },
    /// Nothing to deliver.
    #[error("Notification has no pages")]
    Empty,
}

/// A titled, paginated notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Title shown on every page.
    pub title: String,
    /// Pages in display order. Never empty.
    pub pages: Vec<Page>,
}

/// Wire form of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPage {
    /// Page body.
    pub text: String,
    /// `Page i/N`, only when there is more than one page.
    pub footer: Option<String>,
}

impl Notification {
    /// Paginate `lines` under `caption`. `None` when there are no lines.
    pub fn paged<S: AsRef<str>>(
        title: impl Into<String>,
        caption: &str,
        lines: &[S],
        limits: PageLimits,
    ) -> Option<Self> {
        let pages = paginate(caption, lines, limits);
        if pages.is_empty() {
            return None;
        }
        Some(Self {
            title: title.into(),
            pages,
        })
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Pages as text with footers.
    pub fn rendered(&self) -> Vec<RenderedPage> {
        let total = self.pages.len();
        self.pages
            .iter()
            .enumerate()
            .map(|(i, page)| RenderedPage {
                text: page.render(),
                footer: (total > 1).then(|| format!("Page {}/{}", i + 1, total)),
            })
            .collect()
    }
}

/// Build the restock notification for newly available items.
pub fn restock_notification(
    newly_available: &LatestObservations,
    now: DateTime<Utc>,
    limits: PageLimits,
) -> Option<Notification> {
    let lines = restock_lines(newly_available);
    Notification::paged(RESTOCK_TITLE, &restock_caption(now), &lines, limits)
}

/// Destination for restock notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver the whole notification. `Ok` means it was accepted.
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Brand, Item, Snapshot, Source, SourceItems, StockStatus};
    use chrono::TimeZone;

    fn many_items(n: usize) -> LatestObservations {
        let items: SourceItems = (0..n)
            .map(|i| {
                let snap = Snapshot::new(
                    Item::new(format!("item{i:03}"), Brand::MarukyuKoyamaen, format!("Blend {i}")),
                    format!("https://example.com/{i}"),
                    StockStatus::InStock,
                    Utc::now(),
                );
                (snap.item.id.clone(), snap)
            })
            .collect();
        LatestObservations::from([(Source::MarukyuKoyamaen, items)])
    }

    #[test]
    fn test_empty_yields_none() {
        let now = Utc.with_ymd_and_hms(2025, 6, 12, 3, 0, 0).unwrap();
        assert!(restock_notification(&LatestObservations::new(), now, PageLimits::default()).is_none());
    }

    #[test]
    fn test_footers_only_on_multi_page() {
        let now = Utc.with_ymd_and_hms(2025, 6, 12, 3, 0, 0).unwrap();

        let single = restock_notification(&many_items(2), now, PageLimits::default()).unwrap();
        assert_eq!(single.page_count(), 1);
        assert_eq!(single.rendered()[0].footer, None);

        // 30 items + header + blank = 32 lines, 14 per page
        let multi = restock_notification(&many_items(30), now, PageLimits::default()).unwrap();
        assert_eq!(multi.page_count(), 3);
        let rendered = multi.rendered();
        assert_eq!(rendered[0].footer.as_deref(), Some("Page 1/3"));
        assert_eq!(rendered[2].footer.as_deref(), Some("Page 3/3"));
        assert!(rendered.iter().all(|p| p.text.starts_with("The latest restocks as of")));
        assert_eq!(multi.title, RESTOCK_TITLE);
    }
}
