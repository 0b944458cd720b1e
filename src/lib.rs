//! # restock-sentinel
//!
//! Restock monitoring for online tea catalogs.
//!
//! The sentinel answers one question:
//!
//! > Which items became available since the last notification that was actually delivered?
//!
//! ## Core Contract
//!
//! 1. Poll every source independently and keep only its latest successful snapshot
//! 2. Reconcile the latest snapshots against a persisted ledger of known items
//! 3. Notify about out-of-stock → in-stock transitions and brand-new in-stock items
//! 4. Commit the ledger only once those notifications have been delivered
//!
//! ## Architecture
//!
//! ```text
//! SourceAdapter ×N → PollOrchestrator → SnapshotTable
//!                                           ↓
//!                          NotificationBatcher (every few seconds)
//!                            ↓            ↓              ↓
//!                     compute_transitions  paginate → NotificationSink
//!                            ↓
//!                      LedgerStore (JSON file or memory)
//! ```
//!
//! ## Delivery Guarantees
//!
//! - A restock is reported at least once: a failed delivery leaves the ledger
//!   untouched and the same items are reported on the next cycle
//! - A failing or hanging source never blocks the others or the batcher
//! - Page order is canonical (source declaration order, then item id)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batcher;
pub mod canonical;
pub mod config;
pub mod engine;
pub mod notify;
pub mod orchestrator;
pub mod query;
pub mod source;
pub mod store;
pub mod table;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use types::{
    Brand, CanonicalState, Item, ItemId, LatestObservations, Snapshot, Source, SourceItems,
    StockStatus, TransitionResult, UnknownSource,
};
pub use engine::compute_transitions;
pub use store::{InMemoryLedger, JsonFileLedger, LedgerStore, StoreError};
pub use table::SnapshotTable;
pub use source::{collect_pages, parse_catalog, CatalogConfig, SourceAdapter, SourceError};
#[cfg(feature = "http")]
pub use source::JsonCatalogSource;
pub use orchestrator::{poll_once, PollOrchestrator, PollOutcome, PollSchedule};
pub use notify::{
    alert_operator, paginate, restock_notification, DeliveryError, LogAlert, LogSink,
    Notification, NotificationSink, OperatorAlert, Page, PageLimits,
};
#[cfg(feature = "http")]
pub use notify::{WebhookAlert, WebhookSink};
pub use batcher::{BatcherConfig, Commit, CycleReport, Delivery, NotificationBatcher};
pub use query::{all_in_stock, in_stock_for, StockQuery};
pub use config::{ConfigError, SentinelConfig};
pub use canonical::{canonical_hash, ledger_fingerprint, to_canonical_bytes};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
