//! Source adapters.
//!
//! An adapter observes one catalog and returns every item it lists with
//! its current availability. Failures come back as [`SourceError`] values
//! so the poller can branch on them; the poller never lets one adapter's
//! failure reach another source.

pub mod catalog;

use async_trait::async_trait;

use crate::types::{Source, SourceItems};

/// Error returned by an adapter for one poll.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Transport failure: connect, TLS, non-success status, body read.
    #[error("Fetch failed for {url}: {reason}")]
    Fetch {
        /// Requested URL.
        url: String,
        /// What went wrong.
        reason: String,
    },
    /// The catalog answered but not in the expected shape.
    #[error("Unexpected catalog shape: {0}")]
    Parse(String),
    /// Anything the adapter did not anticipate.
    #[error("Adapter fault: {0}")]
    Unexpected(String),
}

impl SourceError {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::Parse(_) => "parse",
            Self::Unexpected(_) => "unexpected",
        }
    }
}

/// Observes one external catalog.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Which catalog this adapter observes.
    fn source(&self) -> Source;

    /// Fetch and parse the catalog once.
    async fn scrape(&self) -> Result<SourceItems, SourceError>;
}

pub use catalog::{collect_pages, parse_catalog, CatalogConfig};
#[cfg(feature = "http")]
pub use catalog::JsonCatalogSource;
