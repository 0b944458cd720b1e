//! Read-only queries over the ledger.
//!
//! Queries never touch the network and never write. They read the ledger
//! as last committed, which may trail the snapshot table by a cycle.

use std::sync::Arc;

use crate::store::{LedgerStore, StoreError};
use crate::types::{CanonicalState, LatestObservations, Source, SourceItems};

/// In-stock items recorded for `source`. Empty when there are none.
pub fn in_stock_for(state: &CanonicalState, source: Source) -> SourceItems {
    state
        .source(source)
        .map(|items| {
            items
                .iter()
                .filter(|(_, snap)| snap.is_in_stock())
                .map(|(id, snap)| (id.clone(), snap.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// In-stock items for every source that has any.
pub fn all_in_stock(state: &CanonicalState) -> LatestObservations {
    state
        .iter()
        .map(|(source, _)| (*source, in_stock_for(state, *source)))
        .filter(|(_, items)| !items.is_empty())
        .collect()
}

/// Query handle over a ledger store.
#[derive(Clone)]
pub struct StockQuery {
    store: Arc<dyn LedgerStore>,
}

impl StockQuery {
    /// Create a query handle.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// In-stock items for one source.
    pub async fn in_stock_for(&self, source: Source) -> Result<SourceItems, StoreError> {
        let state = self.store.load().await?;
        Ok(in_stock_for(&state, source))
    }

    /// In-stock items across all sources.
    pub async fn all_in_stock(&self) -> Result<LatestObservations, StoreError> {
        let state = self.store.load().await?;
        Ok(all_in_stock(&state))
    }

    /// The ledger as currently committed.
    pub async fn ledger(&self) -> Result<CanonicalState, StoreError> {
        self.store.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryLedger;
    use crate::types::{Brand, Item, ItemId, Snapshot, StockStatus};
    use chrono::Utc;

    fn state() -> CanonicalState {
        let mut state = CanonicalState::new();
        let mut add = |source, id: &str, status| {
            state.insert(
                source,
                Snapshot::new(
                    Item::new(id, Brand::Unknown, id),
                    format!("https://example.com/{id}"),
                    status,
                    Utc::now(),
                ),
            )
        };
        add(Source::Ippodo, "a", StockStatus::InStock);
        add(Source::Ippodo, "b", StockStatus::OutOfStock);
        add(Source::Sazen, "c", StockStatus::OutOfStock);
        add(Source::SteepingRoom, "d", StockStatus::InStock);
        state
    }

    #[test]
    fn test_in_stock_for_source() {
        let items = in_stock_for(&state(), Source::Ippodo);
        assert_eq!(items.keys().collect::<Vec<_>>(), vec![&ItemId::new("a")]);

        assert!(in_stock_for(&state(), Source::Sazen).is_empty());
        assert!(in_stock_for(&state(), Source::NakamuraTokichi).is_empty());
    }

    #[test]
    fn test_all_in_stock_skips_empty_sources() {
        let all = all_in_stock(&state());
        assert_eq!(
            all.keys().copied().collect::<Vec<_>>(),
            vec![Source::Ippodo, Source::SteepingRoom]
        );
    }

    #[tokio::test]
    async fn test_query_reads_store_without_writing() {
        let store = Arc::new(InMemoryLedger::with_state(state()));
        let query = StockQuery::new(store.clone());

        assert_eq!(query.all_in_stock().await.unwrap().len(), 2);
        assert_eq!(query.in_stock_for(Source::SteepingRoom).await.unwrap().len(), 1);
        assert_eq!(store.save_count(), 0);
    }
}
