//! Record types for each pipeline stage plus the per-run context.
//!
//! Stage outputs are separate owned types: the reader produces `RawRecord`,
//! coercion produces `CoercedRecord`, deduplication produces `CleanRecord`.
//! No stage mutates an earlier stage's rows in place.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One untyped input row, exactly as read from a batch file.
///
/// All business fields are kept as strings; `None` means the source file did
/// not carry the column (or NDJSON had null). Coercion failures belong to
/// the next stage, not to parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub source_file: String,
    pub ingest_ts: String,
}

/// A row after per-field type coercion. `None` marks a coercion failure and
/// carries the diagnostic into quarantine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercedRecord {
    pub date: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub source_file: String,
    pub ingest_ts: String,
}

impl CoercedRecord {
    /// Validity is derived, not stored: date present, quantity and unit_price
    /// present and non-negative, both ids present and non-empty.
    pub fn is_valid(&self) -> bool {
        self.date.is_some()
            && self.quantity.map_or(false, |q| q >= 0.0)
            && self.unit_price.map_or(false, |p| p >= 0.0)
            && self.customer_id.as_deref().map_or(false, |s| !s.is_empty())
            && self.product_id.as_deref().map_or(false, |s| !s.is_empty())
    }
}

/// A validated, deduplicated sale with the derived monetary amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    pub date: NaiveDate,
    pub customer_id: String,
    pub product_id: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub ingest_ts: String,
}

impl CleanRecord {
    /// Natural key for dedup and upsert.
    pub fn natural_key(&self) -> (NaiveDate, &str, &str) {
        (self.date, self.customer_id.as_str(), self.product_id.as_str())
    }
}

/// Per-run context: one ingest timestamp shared by every row of the run plus
/// a batch identifier derived from it.
///
/// Threaded explicitly through the reader and persistence instead of reading
/// wall-clock time ad hoc, so runs are deterministic and testable.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub started_at: DateTime<Utc>,
    pub batch_id: String,
}

impl RunContext {
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// Build a context at a fixed instant (test injection).
    pub fn at(started_at: DateTime<Utc>) -> Self {
        let batch_id = format!("batch-{}", started_at.format("%Y%m%dT%H%M%SZ"));
        Self {
            started_at,
            batch_id,
        }
    }

    /// ISO-8601 UTC string stamped onto every row of the run.
    pub fn ingest_ts(&self) -> String {
        self.started_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn coerced(date: Option<NaiveDate>, q: Option<f64>, p: Option<f64>) -> CoercedRecord {
        CoercedRecord {
            date,
            customer_id: Some("C001".to_string()),
            product_id: Some("P10".to_string()),
            quantity: q,
            unit_price: p,
            source_file: "t.csv".to_string(),
            ingest_ts: "2025-01-10T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn valid_row_passes() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 3);
        assert!(coerced(d, Some(2.0), Some(12.5)).is_valid());
    }

    #[test]
    fn negative_quantity_is_invalid() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 5);
        assert!(!coerced(d, Some(-1.0), Some(8.0)).is_valid());
    }

    #[test]
    fn missing_price_is_invalid() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 6);
        assert!(!coerced(d, Some(2.0), None).is_valid());
    }

    #[test]
    fn empty_customer_id_is_invalid() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 3);
        let mut rec = coerced(d, Some(1.0), Some(1.0));
        rec.customer_id = Some(String::new());
        assert!(!rec.is_valid());
        rec.customer_id = None;
        assert!(!rec.is_valid());
    }

    #[test]
    fn run_context_is_stable_per_instant() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 10, 12, 30, 0).unwrap();
        let ctx = RunContext::at(ts);
        assert_eq!(ctx.batch_id, "batch-20250110T123000Z");
        assert_eq!(ctx.ingest_ts(), "2025-01-10T12:30:00.000000Z");
    }
}
