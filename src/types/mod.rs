//! Core types for the restock monitor.

pub mod source;
pub mod item;
pub mod snapshot;
pub mod ledger;

pub use source::{Source, UnknownSource};
pub use item::{Item, ItemId, Brand};
pub use snapshot::{Snapshot, StockStatus};
pub use ledger::{CanonicalState, LatestObservations, SourceItems, TransitionResult};
