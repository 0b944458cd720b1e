//! Ledger storage backends.
//!
//! The ledger has exactly one writer (the notification batcher). Readers
//! such as the query API may run concurrently and must only ever see a
//! complete ledger, which backends guarantee by replacing it atomically.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::types::CanonicalState;

/// Error type for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Persisted ledger exists but is not a valid ledger.
    #[error("Corrupt ledger at {path}: {source}")]
    Deserialization {
        /// Ledger path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Ledger could not be encoded.
    #[error("Failed to serialize ledger: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Filesystem failure while reading or replacing the ledger.
    #[error("Ledger I/O failed at {path}: {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Trait for ledger storage backends.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the ledger. A ledger that was never saved loads as empty.
    async fn load(&self) -> Result<CanonicalState, StoreError>;

    /// Replace the ledger with `state`.
    async fn save(&self, state: &CanonicalState) -> Result<(), StoreError>;
}

pub use file::JsonFileLedger;
pub use memory::InMemoryLedger;
