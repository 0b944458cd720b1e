//! Ledger and reconciliation result types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::item::ItemId;
use super::snapshot::Snapshot;
use super::source::Source;

/// Items observed for one source, keyed by item id.
pub type SourceItems = BTreeMap<ItemId, Snapshot>;

/// Per-source observations, as read from the snapshot table.
pub type LatestObservations = BTreeMap<Source, SourceItems>;

/// The durable record of last-known, already-acted-upon snapshots.
///
/// Item keys are append-only: an item once recorded stays in the ledger
/// even when its source stops listing it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalState {
    sources: BTreeMap<Source, SourceItems>,
}

impl CanonicalState {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Items recorded for a source.
    pub fn source(&self, source: Source) -> Option<&SourceItems> {
        self.sources.get(&source)
    }

    /// Mutable items for a source, creating an empty entry if absent.
    pub fn source_entry(&mut self, source: Source) -> &mut SourceItems {
        self.sources.entry(source).or_default()
    }

    /// Recorded snapshot for one item.
    pub fn get(&self, source: Source, id: &ItemId) -> Option<&Snapshot> {
        self.sources.get(&source).and_then(|items| items.get(id))
    }

    /// Insert or replace one item.
    pub fn insert(&mut self, source: Source, snapshot: Snapshot) {
        self.source_entry(source)
            .insert(snapshot.item.id.clone(), snapshot);
    }

    /// Iterate sources in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (&Source, &SourceItems)> {
        self.sources.iter()
    }

    /// Number of sources with an entry.
    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Total number of recorded items.
    pub fn num_items(&self) -> usize {
        self.sources.values().map(BTreeMap::len).sum()
    }

    /// Check if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl FromIterator<(Source, SourceItems)> for CanonicalState {
    fn from_iter<I: IntoIterator<Item = (Source, SourceItems)>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

/// Outcome of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// Notify-worthy items, only for sources with at least one.
    pub newly_available: LatestObservations,
    /// The ledger after applying the observations.
    pub updated_state: CanonicalState,
}

impl TransitionResult {
    /// Whether anything is worth notifying about.
    pub fn has_newly_available(&self) -> bool {
        !self.newly_available.is_empty()
    }

    /// Number of notify-worthy items across all sources.
    pub fn newly_available_count(&self) -> usize {
        self.newly_available.values().map(BTreeMap::len).sum()
    }
}
