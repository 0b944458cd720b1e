//! In-memory ledger for testing.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::CanonicalState;
use super::{LedgerStore, StoreError};

/// In-memory ledger for testing.
///
/// Counts saves so tests can assert on the batcher's commit policy.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<CanonicalState>,
    saves: Mutex<usize>,
}

impl InMemoryLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with `state`.
    pub fn with_state(state: CanonicalState) -> Self {
        Self {
            state: Mutex::new(state),
            saves: Mutex::new(0),
        }
    }

    /// Current contents.
    pub fn current(&self) -> CanonicalState {
        self.state.lock().clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn load(&self) -> Result<CanonicalState, StoreError> {
        Ok(self.state.lock().clone())
    }

    async fn save(&self, state: &CanonicalState) -> Result<(), StoreError> {
        *self.state.lock() = state.clone();
        *self.saves.lock() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Brand, Item, Snapshot, Source, StockStatus};
    use chrono::Utc;

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemoryLedger::new();
        assert!(store.load().await.unwrap().is_empty());

        let mut state = CanonicalState::new();
        state.insert(
            Source::Sazen,
            Snapshot::new(
                Item::new("s1", Brand::Kanbayashi, "Kinsho"),
                "https://example.com/s1",
                StockStatus::InStock,
                Utc::now(),
            ),
        );
        store.save(&state).await.unwrap();

        assert_eq!(store.load().await.unwrap(), state);
        assert_eq!(store.save_count(), 1);
    }
}
