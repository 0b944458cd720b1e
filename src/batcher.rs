//! Notification batcher.
//!
//! The batcher is the ledger's only writer. On its own fixed cadence it
//! loads the ledger, reconciles it against whatever the snapshot table
//! holds, tries to deliver a notification for newly available items and
//! then decides whether to commit.
//!
//! ## Commit Policy
//!
//! The new ledger is saved iff there was nothing to notify about, or the
//! notification was delivered. A failed (or disabled) delivery leaves the
//! ledger as it was, so the same items are reported again next cycle.
//! Delivery is therefore at-least-once: a restock may be announced twice,
//! but is never recorded as known without an announcement.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::canonical::ledger_fingerprint;
use crate::engine::compute_transitions;
use crate::notify::{
    alert_operator, restock_notification, DeliveryError, NotificationSink, OperatorAlert,
    PageLimits,
};
use crate::orchestrator::sleep_or_shutdown;
use crate::store::{LedgerStore, StoreError};
use crate::table::SnapshotTable;

/// Batcher settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatcherConfig {
    /// Delay between cycles.
    pub interval: Duration,
    /// When false, nothing is sent and restocks are never committed.
    pub notifications_enabled: bool,
    /// Page caps for notifications.
    pub page_limits: PageLimits,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            notifications_enabled: true,
            page_limits: PageLimits::default(),
        }
    }
}

/// What happened to the notification in one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing newly available.
    NotNeeded,
    /// Items were available but notifications are switched off.
    Disabled,
    /// Sink accepted a notification of this many pages.
    Delivered(usize),
    /// Sink failed.
    Failed(DeliveryError),
}

impl Delivery {
    /// Whether the sink accepted a notification.
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }
}

/// What happened to the ledger in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// New ledger was saved.
    Saved,
    /// New ledger equals the stored one; nothing written.
    Unchanged,
    /// Save withheld because delivery did not succeed.
    Withheld,
}

/// Summary of one batcher cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of newly available items found.
    pub newly_available: usize,
    /// Notification outcome.
    pub delivery: Delivery,
    /// Ledger outcome.
    pub commit: Commit,
}

/// Whether a cycle may persist its new ledger.
pub fn may_commit(has_newly_available: bool, delivery_succeeded: bool) -> bool {
    !has_newly_available || delivery_succeeded
}

/// Periodically reconciles, notifies and commits.
pub struct NotificationBatcher {
    store: Arc<dyn LedgerStore>,
    table: SnapshotTable,
    sink: Arc<dyn NotificationSink>,
    alert: Arc<dyn OperatorAlert>,
    config: BatcherConfig,
}

impl NotificationBatcher {
    /// Create a batcher.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        table: SnapshotTable,
        sink: Arc<dyn NotificationSink>,
        alert: Arc<dyn OperatorAlert>,
        config: BatcherConfig,
    ) -> Self {
        Self {
            store,
            table,
            sink,
            alert,
            config,
        }
    }

    /// Batcher settings.
    pub fn config(&self) -> &BatcherConfig {
        &self.config
    }

    /// Run one cycle stamped with the current time.
    pub async fn run_cycle(&self) -> Result<CycleReport, StoreError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle; `now` goes into the notification caption.
    ///
    /// A corrupt ledger aborts the cycle with an error before anything is
    /// delivered or written.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport, StoreError> {
        let ledger = self.store.load().await?;
        let latest = self.table.read();
        let result = compute_transitions(&latest, &ledger);
        let newly_available = result.newly_available_count();

        let delivery = if !result.has_newly_available() {
            Delivery::NotNeeded
        } else if !self.config.notifications_enabled {
            Delivery::Disabled
        } else {
            match restock_notification(&result.newly_available, now, self.config.page_limits) {
                Some(notification) => {
                    info!(
                        items = newly_available,
                        pages = notification.page_count(),
                        "Sending restock notification"
                    );
                    match self.sink.deliver(&notification).await {
                        Ok(()) => Delivery::Delivered(notification.page_count()),
                        Err(e) => {
                            error!(error = %e, "Failed to send restock notification");
                            Delivery::Failed(e)
                        }
                    }
                }
                None => Delivery::NotNeeded,
            }
        };

        let commit = if !may_commit(result.has_newly_available(), delivery.succeeded()) {
            warn!(items = newly_available, "Restocks not delivered, ledger left unchanged");
            Commit::Withheld
        } else if result.updated_state == ledger {
            Commit::Unchanged
        } else {
            self.store.save(&result.updated_state).await?;
            Commit::Saved
        };

        debug!(
            items = newly_available,
            commit = ?commit,
            ledger_fingerprint = %ledger_fingerprint(&result.updated_state),
            "Cycle finished"
        );

        Ok(CycleReport {
            newly_available,
            delivery,
            commit,
        })
    }

    /// Run cycles until `shutdown` turns `true` or its sender is dropped.
    ///
    /// Cycle errors are logged and reported to the operator; the loop
    /// carries on with the next cycle.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            notifications_enabled = self.config.notifications_enabled,
            "Starting notification batcher"
        );

        loop {
            let cycle_id = uuid::Uuid::new_v4();
            let span = info_span!("cycle", cycle_id = %cycle_id);

            if let Err(e) = self.run_cycle().instrument(span.clone()).await {
                span.in_scope(|| error!(error = %e, "Batcher cycle failed"));
                let message = format!(
                    "An error occurred in the restock batcher (cycle {}):\n{}",
                    cycle_id, e
                );
                alert_operator(self.alert.as_ref(), &message).await;
            }

            if sleep_or_shutdown(self.config.interval, &mut shutdown).await {
                break;
            }
        }
        info!("Notification batcher stopped");
    }
}
