//! Availability snapshots.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

use super::item::Item;

/// Availability of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockStatus {
    /// Purchasable right now.
    #[serde(rename = "instock")]
    InStock,
    /// Listed but sold out.
    #[serde(rename = "outofstock")]
    OutOfStock,
}

impl StockStatus {
    /// Whether the item can be bought.
    pub fn is_in_stock(&self) -> bool {
        matches!(self, Self::InStock)
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InStock => write!(f, "instock"),
            Self::OutOfStock => write!(f, "outofstock"),
        }
    }
}

/// One observed availability record for an item.
///
/// Snapshots are never mutated after creation. A status flip in the
/// ledger produces a new value via [`Snapshot::with_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The observed item.
    pub item: Item,
    /// Product page URL.
    pub url: String,
    /// Observed availability.
    pub stock_status: StockStatus,
    /// When the observation was made.
    ///
    /// Written as RFC 3339. Older ledgers used `%Y-%m-%d %H:%M:%S,%3f`
    /// in UTC; both are accepted on read.
    #[serde(deserialize_with = "deserialize_as_of")]
    pub as_of: DateTime<Utc>,
}

/// Timestamp layout of ledgers written before RFC 3339.
pub const LEGACY_AS_OF_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Parse an `as_of` value in either accepted layout.
pub fn parse_as_of(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, LEGACY_AS_OF_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn deserialize_as_of<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_as_of(&raw).ok_or_else(|| de::Error::custom(format!("invalid as_of timestamp: {:?}", raw)))
}

impl Snapshot {
    /// Create a new snapshot.
    pub fn new(
        item: Item,
        url: impl Into<String>,
        stock_status: StockStatus,
        as_of: DateTime<Utc>,
    ) -> Self {
        Self {
            item,
            url: url.into(),
            stock_status,
            as_of,
        }
    }

    /// Copy of this snapshot with a different status and everything else kept.
    pub fn with_status(&self, stock_status: StockStatus) -> Self {
        Self {
            stock_status,
            ..self.clone()
        }
    }

    /// Whether the item was in stock at observation time.
    pub fn is_in_stock(&self) -> bool {
        self.stock_status.is_in_stock()
    }
}
