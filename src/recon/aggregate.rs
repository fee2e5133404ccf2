//! Grouping of normalized rows into per-event, per-account buckets.

use std::collections::HashMap;

use super::types::{EventRecord, NormalizedRow};

/// Bucket key for rows whose account cell was empty or a null marker.
///
/// Collapsing them onto one sentinel keeps event-level bookings from the
/// two sources pairable even when only one side carries account ids.
pub const NO_ACCOUNT: &str = "_NO_ACCOUNT_";

/// Result of grouping both sources' rows.
#[derive(Debug)]
pub struct Aggregation {
    /// Events in first-seen row order.
    pub events: Vec<EventRecord>,
    /// Rows dropped because they had no usable event key.
    pub rows_without_event_key: usize,
}

/// Group normalized rows by event key, then by account within each event.
///
/// Event order follows first appearance in the input, so callers control
/// overall ordering by the order they concatenate sources. When a source
/// books the same (event, account) twice on one side, the later row wins.
pub fn aggregate(rows: Vec<NormalizedRow>) -> Aggregation {
    let mut order: Vec<String> = Vec::new();
    let mut events: HashMap<String, EventRecord> = HashMap::new();
    let mut rows_without_event_key = 0usize;

    for row in rows {
        let Some(event_key) = row.event_key else {
            rows_without_event_key += 1;
            tracing::debug!(
                side = %row.side,
                row_id = ?row.entry.row_id,
                "Row has no event key, dropped"
            );
            continue;
        };

        let event = events.entry(event_key.clone()).or_insert_with(|| {
            order.push(event_key.clone());
            EventRecord::new(event_key.clone())
        });

        let account_key = bucket_key(row.account_id.as_deref());
        let bucket = event.accounts.entry(account_key.clone()).or_default();
        let slot = bucket.slot_mut(row.side);
        if slot.is_some() {
            tracing::warn!(
                event_key = %event.event_key,
                account = %account_key,
                side = %row.side,
                "Duplicate booking for this side, keeping the later row"
            );
        }
        *slot = Some(row.entry);
    }

    if rows_without_event_key > 0 {
        tracing::warn!(rows = rows_without_event_key, "Dropped rows without an event key");
    }

    Aggregation {
        events: order.into_iter().filter_map(|key| events.remove(&key)).collect(),
        rows_without_event_key,
    }
}

/// Normalize a raw account cell into a bucket key.
fn bucket_key(account_id: Option<&str>) -> String {
    let Some(raw) = account_id else {
        return NO_ACCOUNT.to_string();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || matches!(trimmed.to_ascii_lowercase().as_str(), "nan" | "none") {
        NO_ACCOUNT.to_string()
    } else {
        trimmed.to_string()
    }
}
