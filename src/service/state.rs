//! Shared service state.

use std::sync::Arc;

use crate::query::StockQuery;
use crate::store::LedgerStore;

/// State shared by all handlers.
#[derive(Clone)]
pub struct ServiceState {
    /// Ledger queries.
    pub query: StockQuery,
}

impl ServiceState {
    /// Create service state over a ledger store.
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            query: StockQuery::new(store),
        }
    }
}
