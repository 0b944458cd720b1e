//! Canonical serialization and ledger fingerprints.
//!
//! ## Determinism Guarantees
//!
//! - Stable field order: Struct fields serialize in declaration order
//! - No HashMap allowed: Use BTreeMap for maps in hashed or persisted data
//! - Same ledger → same bytes → same fingerprint

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

use crate::types::CanonicalState;

/// Serialize a value to canonical JSON bytes.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> Result<u64, serde_json::Error> {
    Ok(xxh64(&to_canonical_bytes(value)?, 0))
}

/// Fingerprint of a ledger as a 16-digit hex string.
///
/// Logged on every save and reported by the query API so operators can
/// tell whether two readers saw the same ledger.
pub fn ledger_fingerprint(state: &CanonicalState) -> String {
    match canonical_hash(state) {
        Ok(hash) => format!("{:016x}", hash),
        Err(_) => "unhashable".to_string(),
    }
}
