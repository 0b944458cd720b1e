//! Poll orchestrator.
//!
//! Runs one long-lived task per source. Each task polls its adapter,
//! publishes the result into the [`SnapshotTable`] under its own key and
//! sleeps for its own interval. Sources never wait on each other.
//!
//! ## Isolation
//!
//! - Every poll attempt runs in its own tokio task bounded by a timeout,
//!   so a hung or panicking adapter only costs its own source one cycle.
//! - A failed attempt leaves the source's previous table entry in place.
//! - No retry budget: a failing source stays in rotation forever.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::source::{SourceAdapter, SourceError};
use crate::table::SnapshotTable;
use crate::types::Source;

/// Cadence of one source's poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Delay between the end of one attempt and the start of the next.
    pub interval: Duration,
    /// Upper bound for one adapter call.
    pub timeout: Duration,
}

impl PollSchedule {
    /// Create a schedule.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Result of a single poll attempt.
#[derive(Debug)]
pub enum PollOutcome {
    /// Adapter answered; this many items were published.
    Published(usize),
    /// Adapter reported an error.
    Failed(SourceError),
    /// Adapter did not answer within the timeout; the attempt was abandoned.
    TimedOut,
}

impl PollOutcome {
    /// Whether the table was updated.
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published(_))
    }
}

/// Poll `adapter` once and publish on success.
pub async fn poll_once(
    adapter: &Arc<dyn SourceAdapter>,
    timeout: Duration,
    table: &SnapshotTable,
) -> PollOutcome {
    let source = adapter.source();
    let task = {
        let adapter = Arc::clone(adapter);
        tokio::spawn(async move { adapter.scrape().await })
    };
    let abort = task.abort_handle();

    match tokio::time::timeout(timeout, task).await {
        Err(_) => {
            abort.abort();
            PollOutcome::TimedOut
        }
        Ok(Err(join_err)) => {
            let reason = if join_err.is_panic() {
                format!("{} adapter panicked", source)
            } else {
                format!("{} adapter task cancelled", source)
            };
            PollOutcome::Failed(SourceError::Unexpected(reason))
        }
        Ok(Ok(Err(e))) => PollOutcome::Failed(e),
        Ok(Ok(Ok(items))) => {
            let count = items.len();
            table.publish(source, items);
            PollOutcome::Published(count)
        }
    }
}

/// Sleep for `delay` unless shutdown is signalled first.
///
/// Returns `true` when the caller should stop. A dropped sender counts
/// as shutdown.
pub(crate) async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

/// Supervises one poller task per source.
#[derive(Debug)]
pub struct PollOrchestrator {
    table: SnapshotTable,
    shutdown: watch::Receiver<bool>,
    tasks: Vec<(Source, JoinHandle<()>)>,
}

impl PollOrchestrator {
    /// Create an orchestrator publishing into `table`.
    ///
    /// Pollers stop when `shutdown` turns `true` or its sender is dropped.
    pub fn new(table: SnapshotTable, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            table,
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Start polling `adapter` on `schedule`.
    pub fn spawn(&mut self, adapter: Arc<dyn SourceAdapter>, schedule: PollSchedule) {
        let source = adapter.source();
        let table = self.table.clone();
        let mut shutdown = self.shutdown.clone();

        info!(
            source = %source,
            interval_secs = schedule.interval.as_secs(),
            timeout_secs = schedule.timeout.as_secs(),
            "Starting poller"
        );

        let handle = tokio::spawn(async move {
            loop {
                let start = Instant::now();
                match poll_once(&adapter, schedule.timeout, &table).await {
                    PollOutcome::Published(items) => info!(
                        source = %source,
                        items = items,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Poll completed"
                    ),
                    PollOutcome::Failed(e) => warn!(
                        source = %source,
                        kind = e.kind(),
                        error = %e,
                        "Poll failed, keeping previous observations"
                    ),
                    PollOutcome::TimedOut => warn!(
                        source = %source,
                        timeout_secs = schedule.timeout.as_secs(),
                        "Poll timed out, keeping previous observations"
                    ),
                }

                if sleep_or_shutdown(schedule.interval, &mut shutdown).await {
                    break;
                }
            }
            info!(source = %source, "Poller stopped");
        });

        self.tasks.push((source, handle));
    }

    /// Sources with a running poller, in spawn order.
    pub fn sources(&self) -> Vec<Source> {
        self.tasks.iter().map(|(source, _)| *source).collect()
    }

    /// Table the pollers publish into.
    pub fn table(&self) -> &SnapshotTable {
        &self.table
    }

    /// Wait for every poller to stop.
    pub async fn join(self) {
        for (source, handle) in self.tasks {
            if let Err(e) = handle.await {
                warn!(source = %source, error = %e, "Poller task ended abnormally");
            }
        }
    }

    /// Stop every poller immediately.
    pub fn abort(&self) {
        for (_, handle) in &self.tasks {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Brand, Item, Snapshot, SourceItems, StockStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behaviour {
        Ok,
        Hang,
        Panic,
        FailAfterFirst,
    }

    struct ScriptedSource {
        source: Source,
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(source: Source, behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                source,
                behaviour,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    fn one_item(source: Source) -> SourceItems {
        let snap = Snapshot::new(
            Item::new("item1", Brand::Unknown, "Matcha"),
            format!("https://example.com/{}", source.slug()),
            StockStatus::InStock,
            Utc::now(),
        );
        SourceItems::from([(snap.item.id.clone(), snap)])
    }

    #[async_trait]
    impl SourceAdapter for ScriptedSource {
        fn source(&self) -> Source {
            self.source
        }

        async fn scrape(&self) -> Result<SourceItems, SourceError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Ok => Ok(one_item(self.source)),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(one_item(self.source))
                }
                Behaviour::Panic => panic!("markup changed"),
                Behaviour::FailAfterFirst if call == 0 => Ok(one_item(self.source)),
                Behaviour::FailAfterFirst => Err(SourceError::Fetch {
                    url: "https://example.com".to_string(),
                    reason: "connection reset".to_string(),
                }),
            }
        }
    }

    fn schedule() -> PollSchedule {
        PollSchedule::new(Duration::from_secs(30), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_publishes() {
        let table = SnapshotTable::new();
        let adapter: Arc<dyn SourceAdapter> = ScriptedSource::new(Source::Sazen, Behaviour::Ok);

        let outcome = poll_once(&adapter, Duration::from_secs(5), &table).await;
        assert!(matches!(outcome, PollOutcome::Published(1)));
        assert!(table.get(Source::Sazen).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_times_out() {
        let table = SnapshotTable::new();
        let adapter: Arc<dyn SourceAdapter> = ScriptedSource::new(Source::Sazen, Behaviour::Hang);

        let outcome = poll_once(&adapter, Duration::from_secs(5), &table).await;
        assert!(matches!(outcome, PollOutcome::TimedOut));
        assert!(table.get(Source::Sazen).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_once_contains_panic() {
        let table = SnapshotTable::new();
        let adapter: Arc<dyn SourceAdapter> = ScriptedSource::new(Source::Sazen, Behaviour::Panic);

        let outcome = poll_once(&adapter, Duration::from_secs(5), &table).await;
        match outcome {
            PollOutcome::Failed(e) => assert_eq!(e.kind(), "unexpected"),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_entry_and_loop_continues() {
        let table = SnapshotTable::new();
        let (tx, rx) = watch::channel(false);
        let flaky = ScriptedSource::new(Source::Ippodo, Behaviour::FailAfterFirst);

        let mut orchestrator = PollOrchestrator::new(table.clone(), rx);
        orchestrator.spawn(flaky.clone(), schedule());

        tokio::time::sleep(Duration::from_secs(95)).await;

        assert!(flaky.calls() >= 3);
        assert_eq!(table.get(Source::Ippodo).unwrap().len(), 1);

        tx.send(true).unwrap();
        orchestrator.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sources_are_isolated() {
        let table = SnapshotTable::new();
        let (tx, rx) = watch::channel(false);
        let healthy = ScriptedSource::new(Source::Sazen, Behaviour::Ok);
        let hung = ScriptedSource::new(Source::Ippodo, Behaviour::Hang);
        let broken = ScriptedSource::new(Source::SteepingRoom, Behaviour::Panic);

        let mut orchestrator = PollOrchestrator::new(table.clone(), rx);
        orchestrator.spawn(healthy.clone(), schedule());
        orchestrator.spawn(hung.clone(), schedule());
        orchestrator.spawn(broken.clone(), schedule());

        tokio::time::sleep(Duration::from_secs(100)).await;

        assert!(healthy.calls() >= 3);
        assert!(broken.calls() >= 2);
        assert!(hung.calls() >= 2);
        assert_eq!(table.sources(), vec![Source::Sazen]);
        assert_eq!(
            orchestrator.sources(),
            vec![Source::Sazen, Source::Ippodo, Source::SteepingRoom]
        );

        tx.send(true).unwrap();
        orchestrator.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_intervals() {
        let table = SnapshotTable::new();
        let (tx, rx) = watch::channel(false);
        let fast = ScriptedSource::new(Source::Sazen, Behaviour::Ok);
        let slow = ScriptedSource::new(Source::Ippodo, Behaviour::Ok);

        let mut orchestrator = PollOrchestrator::new(table, rx);
        orchestrator.spawn(fast.clone(), PollSchedule::new(Duration::from_secs(10), Duration::from_secs(5)));
        orchestrator.spawn(slow.clone(), PollSchedule::new(Duration::from_secs(60), Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(65)).await;

        assert!(fast.calls() >= 6);
        assert_eq!(slow.calls(), 2);

        tx.send(true).unwrap();
        orchestrator.join().await;
    }
}
