//! Text for restock notifications.

use chrono::{DateTime, Utc};

use crate::types::{LatestObservations, Source};

/// Title of a restock notification.
pub const RESTOCK_TITLE: &str = "🔔 NEW/RESTOCKED ITEMS 🔔";

/// Caption repeated at the top of every page.
pub fn restock_caption(now: DateTime<Utc>) -> String {
    format!("The latest restocks as of {}", now.format("%B %-d, %-I:%M%p UTC"))
}

/// Header line opening a source's group.
pub fn source_header(source: Source) -> String {
    format!("🍵 {} 🍵", source)
}

/// Build the grouped line sequence for `items`.
///
/// Each source contributes a header, one line per item and a closing
/// blank line, in map order.
pub fn restock_lines(items: &LatestObservations) -> Vec<String> {
    let mut lines = Vec::with_capacity(items.values().map(|i| i.len() + 2).sum());
    for (source, snapshots) in items {
        lines.push(source_header(*source));
        for snapshot in snapshots.values() {
            lines.push(format!("[✨ {}]({})", snapshot.item.label(), snapshot.url));
        }
        lines.push(String::new());
    }
    lines
}
