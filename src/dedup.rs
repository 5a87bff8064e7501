//! Deduplicator: last-write-wins on the natural key.
//!
//! Upstream systems may resend corrected rows for the same logical sale
//! (same date, customer and product); the latest ingested value must win.
//! The input is sorted ascending by `ingest_ts` with a stable sort, so ties
//! within one run resolve by arrival order.

use crate::record::{CleanRecord, CoercedRecord};
use std::collections::HashMap;

/// Collapse the valid set to one row per `(date, customer_id, product_id)`
/// and derive `amount = quantity × unit_price`.
///
/// Output is sorted by natural key so persisted row order is deterministic.
/// Idempotent: running it over its own output is a no-op.
pub fn deduplicate(valid: Vec<CoercedRecord>) -> Vec<CleanRecord> {
    let input_len = valid.len();

    let mut sorted = valid;
    sorted.sort_by(|a, b| a.ingest_ts.cmp(&b.ingest_ts));

    let mut by_key: HashMap<(String, String, String), CleanRecord> = HashMap::new();
    for row in sorted {
        // Callers pass only valid rows; anything else cannot be keyed.
        let (Some(date), Some(customer_id), Some(product_id), Some(quantity), Some(unit_price)) = (
            row.date,
            row.customer_id,
            row.product_id,
            row.quantity,
            row.unit_price,
        ) else {
            log::warn!("⚠️  Skipping non-valid row in dedup input ({})", row.source_file);
            continue;
        };

        let key = (date.to_string(), customer_id.clone(), product_id.clone());
        by_key.insert(
            key,
            CleanRecord {
                date,
                customer_id,
                product_id,
                quantity,
                unit_price,
                amount: quantity * unit_price,
                ingest_ts: row.ingest_ts,
            },
        );
    }

    let mut clean: Vec<CleanRecord> = by_key.into_values().collect();
    clean.sort_by(|a, b| a.natural_key().cmp(&b.natural_key()));

    log::info!("🔁 Deduplicated {} valid rows into {} sales", input_len, clean.len());
    clean
}
