//! JSON file ledger with atomic replacement.
//!
//! ## File Format
//!
//! ```text
//! {
//!   "<source>": {
//!     "<item id>": {
//!       "item": { "id": ..., "brand": ..., "name": ... },
//!       "url": ...,
//!       "stock_status": "instock" | "outofstock",
//!       "as_of": "<RFC 3339 timestamp>"   (legacy "%Y-%m-%d %H:%M:%S,%3f" is read too)
//!     }
//!   }
//! }
//! ```
//!
//! Saves write `<file>.tmp` completely, fsync it, then rename it over
//! `<file>`. A reader sees either the previous ledger or the new one.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::canonical::ledger_fingerprint;
use crate::types::CanonicalState;
use super::{LedgerStore, StoreError};

/// Ledger persisted as a pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileLedger {
    path: PathBuf,
}

impl JsonFileLedger {
    /// Create a ledger backed by `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Canonical ledger path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path used while writing.
    pub fn temp_path(&self) -> PathBuf {
        let mut name: OsString = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
        move |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[async_trait]
impl LedgerStore for JsonFileLedger {
    async fn load(&self) -> Result<CanonicalState, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No ledger on disk, starting empty");
                return Ok(CanonicalState::new());
            }
            Err(e) => return Err(Self::io_error(&self.path)(e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Deserialization {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, state: &CanonicalState) -> Result<(), StoreError> {
        let text = serde_json::to_vec_pretty(state).map_err(StoreError::Serialization)?;
        let temp_path = self.temp_path();

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(Self::io_error(&temp_path))?;
        file.write_all(&text)
            .await
            .map_err(Self::io_error(&temp_path))?;
        file.sync_all()
            .await
            .map_err(Self::io_error(&temp_path))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(Self::io_error(&self.path))?;

        tracing::info!(
            path = %self.path.display(),
            items = state.num_items(),
            ledger_fingerprint = %ledger_fingerprint(state),
            "Ledger saved"
        );
        Ok(())
    }
}
