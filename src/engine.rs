//! Reconciliation engine.
//!
//! Compares the latest per-source observations against the ledger and
//! decides which items are worth a notification.
//!
//! ## Transition Rules
//!
//! | Ledger | Latest | Ledger after | Notify |
//! |--------|--------|--------------|--------|
//! | absent | InStock | inserted | yes |
//! | absent | OutOfStock | inserted | no |
//! | OutOfStock | InStock | status flipped | yes |
//! | InStock | OutOfStock | status flipped | no |
//! | same status | same status | untouched | no |
//!
//! A status flip only rewrites `stock_status`; the stored name, URL and
//! timestamp stay as first recorded. Sources and items missing from the
//! latest observations are carried over unchanged.
//!
//! ## Determinism Guarantees
//!
//! - Same observations + same ledger → identical `TransitionResult`
//! - No I/O and no clock reads
//! - The caller's ledger is never mutated

use crate::types::{
    CanonicalState, ItemId, LatestObservations, SourceItems, StockStatus, TransitionResult,
};

/// Compute the transitions between `latest` and `state`.
pub fn compute_transitions(
    latest: &LatestObservations,
    state: &CanonicalState,
) -> TransitionResult {
    let mut updated_state = state.clone();
    let mut newly_available = LatestObservations::new();

    for (source, items) in latest {
        let ledger = updated_state.source_entry(*source);
        let mut notify = SourceItems::new();

        for (id, observed) in items {
            match ledger.get(id).map(|stored| stored.stock_status) {
                None => {
                    ledger.insert(id.clone(), observed.clone());
                    if observed.is_in_stock() {
                        notify.insert(id.clone(), observed.clone());
                    }
                }
                Some(StockStatus::OutOfStock) if observed.is_in_stock() => {
                    flip(ledger, id, StockStatus::InStock);
                    notify.insert(id.clone(), observed.clone());
                }
                Some(StockStatus::InStock) if !observed.is_in_stock() => {
                    flip(ledger, id, StockStatus::OutOfStock);
                }
                Some(_) => {}
            }
        }

        if !notify.is_empty() {
            newly_available.insert(*source, notify);
        }
    }

    TransitionResult {
        newly_available,
        updated_state,
    }
}

fn flip(ledger: &mut SourceItems, id: &ItemId, status: StockStatus) {
    if let Some(stored) = ledger.get_mut(id) {
        *stored = stored.with_status(status);
    }
}
