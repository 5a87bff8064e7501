//! Quarantine sink: invalid rows written to a CSV for manual review.
//!
//! Rows are written with their coerced values, so the failing field is the
//! one left empty (or out of range) in the file. Quarantined rows are never
//! merged back into reporting data.

use crate::error::PipelineError;
use crate::record::CoercedRecord;
use std::fs;
use std::path::Path;

/// Write the quarantine file, overwriting any previous run's content.
///
/// Unconditional: an empty invalid set still produces a header-only file.
pub fn write_quarantine(invalid: &[CoercedRecord], path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    if invalid.is_empty() {
        // serialize() emits headers lazily; an empty set still gets them.
        writer.write_record([
            "date",
            "customer_id",
            "product_id",
            "quantity",
            "unit_price",
            "source_file",
            "ingest_ts",
        ])?;
    }
    for row in invalid {
        writer.serialize(row)?;
    }
    writer.flush()?;

    log::info!("🗂️  Quarantined {} rows to {}", invalid.len(), path.display());
    Ok(())
}
