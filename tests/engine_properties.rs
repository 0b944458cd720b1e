//! Property tests for reconciliation.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use restock_sentinel::{
    compute_transitions, Brand, CanonicalState, Item, ItemId, LatestObservations, Snapshot,
    Source, SourceItems, StockStatus,
};

fn snap(id: &str, in_stock: bool) -> Snapshot {
    let status = if in_stock {
        StockStatus::InStock
    } else {
        StockStatus::OutOfStock
    };
    Snapshot::new(
        Item::new(id, Brand::Unknown, id.to_uppercase()),
        format!("https://example.com/{id}"),
        status,
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn source_items() -> impl Strategy<Value = SourceItems> {
    proptest::collection::btree_map("[a-f]", any::<bool>(), 0..6).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, in_stock)| (ItemId::new(id.clone()), snap(&id, in_stock)))
            .collect()
    })
}

fn observations() -> impl Strategy<Value = LatestObservations> {
    proptest::collection::btree_map(
        proptest::sample::select(Source::ALL.to_vec()),
        source_items(),
        0..4,
    )
}

fn ledger() -> impl Strategy<Value = CanonicalState> {
    observations().prop_map(|obs| obs.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_reconciliation_is_deterministic(latest in observations(), state in ledger()) {
        prop_assert_eq!(
            compute_transitions(&latest, &state),
            compute_transitions(&latest, &state)
        );
    }

    #[test]
    fn prop_reapplying_same_observations_is_quiet(latest in observations(), state in ledger()) {
        let first = compute_transitions(&latest, &state);
        let second = compute_transitions(&latest, &first.updated_state);

        prop_assert!(second.newly_available.is_empty());
        prop_assert_eq!(second.updated_state, first.updated_state);
    }

    #[test]
    fn prop_ledger_keys_are_append_only(latest in observations(), state in ledger()) {
        let result = compute_transitions(&latest, &state);

        for (source, items) in state.iter() {
            for id in items.keys() {
                prop_assert!(result.updated_state.get(*source, id).is_some());
            }
        }
        for (source, items) in &latest {
            for id in items.keys() {
                prop_assert!(result.updated_state.get(*source, id).is_some());
            }
        }
    }

    #[test]
    fn prop_only_fresh_availability_is_reported(latest in observations(), state in ledger()) {
        let result = compute_transitions(&latest, &state);

        for (source, items) in &result.newly_available {
            prop_assert!(!items.is_empty());
            for (id, reported) in items {
                prop_assert_eq!(reported.stock_status, StockStatus::InStock);
                prop_assert_eq!(Some(reported), latest.get(source).and_then(|i| i.get(id)));
                let before = state.get(*source, id).map(|s| s.stock_status);
                prop_assert_ne!(before, Some(StockStatus::InStock));
            }
        }

        for (source, items) in &latest {
            for (id, observed) in items {
                let was_in_stock = state
                    .get(*source, id)
                    .map_or(false, Snapshot::is_in_stock);
                let reported = result
                    .newly_available
                    .get(source)
                    .map_or(false, |i| i.contains_key(id));
                prop_assert_eq!(reported, observed.is_in_stock() && !was_in_stock);
                prop_assert_eq!(
                    result.updated_state.get(*source, id).map(|s| s.stock_status),
                    Some(observed.stock_status)
                );
            }
        }
    }
}
