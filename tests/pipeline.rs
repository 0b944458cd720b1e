//! Pollers and batcher running together on paused time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::watch;

use restock_sentinel::{
    BatcherConfig, Brand, Commit, DeliveryError, InMemoryLedger, Item, ItemId, LedgerStore,
    LogAlert, Notification, NotificationBatcher, NotificationSink, PollOrchestrator,
    PollSchedule, Snapshot, SnapshotTable, Source, SourceAdapter, SourceError, SourceItems,
    StockStatus,
};

/// Adapter whose catalog the test can change between polls.
struct ShelfSource {
    source: Source,
    status: Mutex<StockStatus>,
}

impl ShelfSource {
    fn new(source: Source, status: StockStatus) -> Arc<Self> {
        Arc::new(Self {
            source,
            status: Mutex::new(status),
        })
    }

    fn set(&self, status: StockStatus) {
        *self.status.lock() = status;
    }
}

#[async_trait]
impl SourceAdapter for ShelfSource {
    fn source(&self) -> Source {
        self.source
    }

    async fn scrape(&self) -> Result<SourceItems, SourceError> {
        let snap = Snapshot::new(
            Item::new("sayaka", Brand::Ippodo, "Sayaka"),
            "https://ippodotea.com/products/sayaka",
            *self.status.lock(),
            Utc::now(),
        );
        Ok(SourceItems::from([(snap.item.id.clone(), snap)]))
    }
}

struct HangingSource;

#[async_trait]
impl SourceAdapter for HangingSource {
    fn source(&self) -> Source {
        Source::Sazen
    }

    async fn scrape(&self) -> Result<SourceItems, SourceError> {
        std::future::pending().await
    }
}

struct PanickingSource;

#[async_trait]
impl SourceAdapter for PanickingSource {
    fn source(&self) -> Source {
        Source::SteepingRoom
    }

    async fn scrape(&self) -> Result<SourceItems, SourceError> {
        panic!("markup changed");
    }
}

#[derive(Default)]
struct CountingSink {
    delivered: Mutex<Vec<Notification>>,
}

#[async_trait]
impl NotificationSink for CountingSink {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.delivered.lock().push(notification.clone());
        Ok(())
    }
}

fn schedule() -> PollSchedule {
    PollSchedule::new(Duration::from_secs(60), Duration::from_secs(10))
}

#[tokio::test(start_paused = true)]
async fn test_faulty_sources_do_not_block_restocks() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let table = SnapshotTable::new();
    let store = Arc::new(InMemoryLedger::new());
    let sink = Arc::new(CountingSink::default());
    let batcher = NotificationBatcher::new(
        store.clone(),
        table.clone(),
        sink.clone(),
        Arc::new(LogAlert),
        BatcherConfig::default(),
    );

    let shelf = ShelfSource::new(Source::Ippodo, StockStatus::InStock);
    let mut orchestrator = PollOrchestrator::new(table.clone(), shutdown_rx);
    orchestrator.spawn(shelf.clone(), schedule());
    orchestrator.spawn(Arc::new(HangingSource), schedule());
    orchestrator.spawn(Arc::new(PanickingSource), schedule());

    // First round done; the hanging poll has timed out.
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(table.sources(), vec![Source::Ippodo]);

    let report = batcher.run_cycle().await.unwrap();
    assert_eq!(report.newly_available, 1);
    assert_eq!(report.commit, Commit::Saved);

    // Sells out: committed without a notification.
    shelf.set(StockStatus::OutOfStock);
    tokio::time::sleep(Duration::from_secs(60)).await;
    let report = batcher.run_cycle().await.unwrap();
    assert_eq!(report.newly_available, 0);
    assert_eq!(report.commit, Commit::Saved);

    // Restocks: announced again.
    shelf.set(StockStatus::InStock);
    tokio::time::sleep(Duration::from_secs(60)).await;
    let report = batcher.run_cycle().await.unwrap();
    assert_eq!(report.newly_available, 1);
    assert_eq!(sink.delivered.lock().len(), 2);
    assert_eq!(
        store
            .current()
            .get(Source::Ippodo, &ItemId::new("sayaka"))
            .map(|s| s.stock_status),
        Some(StockStatus::InStock)
    );

    shutdown_tx.send(true).unwrap();
    orchestrator.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_batcher_loop_commits_and_stops_on_shutdown() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let table = SnapshotTable::new();
    let store = Arc::new(InMemoryLedger::new());
    let sink = Arc::new(CountingSink::default());

    let shelf = ShelfSource::new(Source::NakamuraTokichi, StockStatus::InStock);
    table.publish(Source::NakamuraTokichi, shelf.scrape().await.unwrap());

    let batcher = NotificationBatcher::new(
        store.clone(),
        table.clone(),
        sink.clone(),
        Arc::new(LogAlert),
        BatcherConfig::default(),
    );
    let handle = tokio::spawn(batcher.run(shutdown_rx));

    // Several cycles pass; only the first has anything to say.
    tokio::time::sleep(Duration::from_secs(16)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(sink.delivered.lock().len(), 1);
    assert_eq!(store.save_count(), 1);
    assert_eq!(store.load().await.unwrap().num_items(), 1);
}
