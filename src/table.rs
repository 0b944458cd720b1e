//! Snapshot table shared between pollers and the batcher.
//!
//! Each source's poller is the only writer of its own key; the batcher is
//! the only reader. Publishing swaps in a whole per-source map, so a read
//! never sees half of a poll's results. Reads across sources are not
//! synchronised with each other: the batcher gets each source's latest
//! published map, whatever cycle it came from.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{LatestObservations, Source, SourceItems};

/// Latest published observations per source.
///
/// Cheap to clone; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct SnapshotTable {
    inner: Arc<RwLock<BTreeMap<Source, Arc<SourceItems>>>>,
}

impl SnapshotTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for `source`. Other sources are untouched.
    pub fn publish(&self, source: Source, items: SourceItems) {
        let items = Arc::new(items);
        self.inner.write().insert(source, items);
    }

    /// Latest entry for one source.
    pub fn get(&self, source: Source) -> Option<Arc<SourceItems>> {
        self.inner.read().get(&source).cloned()
    }

    /// Copy out the whole table for reconciliation.
    pub fn read(&self) -> LatestObservations {
        let entries: Vec<(Source, Arc<SourceItems>)> = self
            .inner
            .read()
            .iter()
            .map(|(source, items)| (*source, Arc::clone(items)))
            .collect();

        entries
            .into_iter()
            .map(|(source, items)| (source, (*items).clone()))
            .collect()
    }

    /// Sources that have published at least once.
    pub fn sources(&self) -> Vec<Source> {
        self.inner.read().keys().copied().collect()
    }
}
