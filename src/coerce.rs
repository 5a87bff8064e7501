//! Coercion and validation engine.
//!
//! Per-field coercion is a pure function returning `Option`: an unparsable
//! value becomes `None` and routes the row to quarantine. The stage is total:
//! every raw row yields exactly one coerced row, classified as valid or
//! invalid with no overlap.

use crate::record::{CoercedRecord, RawRecord};
use chrono::NaiveDate;

/// Coerce every raw row and partition into (valid, invalid) sets.
pub fn partition(raw: Vec<RawRecord>) -> (Vec<CoercedRecord>, Vec<CoercedRecord>) {
    let total = raw.len();
    let mut valid = Vec::new();
    let mut invalid = Vec::new();

    for row in raw {
        let coerced = coerce_row(row);
        if coerced.is_valid() {
            valid.push(coerced);
        } else {
            invalid.push(coerced);
        }
    }

    log::info!(
        "🧪 Coerced {} rows: {} valid, {} quarantined",
        total,
        valid.len(),
        invalid.len()
    );
    (valid, invalid)
}

fn coerce_row(row: RawRecord) -> CoercedRecord {
    CoercedRecord {
        date: row.date.as_deref().and_then(parse_date),
        customer_id: row.customer_id.and_then(non_empty),
        product_id: row.product_id.and_then(non_empty),
        quantity: row.quantity.as_deref().and_then(parse_quantity),
        unit_price: row.unit_price.as_deref().and_then(parse_money),
        source_file: row.source_file,
        ingest_ts: row.ingest_ts,
    }
}

/// Permissive calendar-date parser. ISO dates are the recommended input, but
/// upstream exports also show up with slashed or day-first formats, and
/// sometimes a full datetime.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }

    // Datetime strings keep their calendar-date prefix.
    if s.len() > 10 {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }
    None
}

pub fn parse_quantity(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Monetary parser accepting both `.` and `,` as the decimal separator.
pub fn parse_money(s: &str) -> Option<f64> {
    let v = s.trim().replace(',', ".").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        date: &str,
        customer: &str,
        product: &str,
        quantity: &str,
        price: &str,
    ) -> RawRecord {
        let opt = |s: &str| {
            if s == "<missing>" {
                None
            } else {
                Some(s.to_string())
            }
        };
        RawRecord {
            date: opt(date),
            customer_id: opt(customer),
            product_id: opt(product),
            quantity: opt(quantity),
            unit_price: opt(price),
            source_file: "t.csv".to_string(),
            ingest_ts: "2025-01-10T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn accepts_common_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        assert_eq!(parse_date("2025-01-03"), Some(expected));
        assert_eq!(parse_date("2025/01/03"), Some(expected));
        assert_eq!(parse_date("03/01/2025"), Some(expected));
        assert_eq!(parse_date("03-01-2025"), Some(expected));
        assert_eq!(parse_date("2025-01-03T10:15:00Z"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn money_accepts_comma_decimal_separator() {
        assert_eq!(parse_money("12.50"), Some(12.5));
        assert_eq!(parse_money("12,50"), Some(12.5));
        assert_eq!(parse_money("doce"), None);
        assert_eq!(parse_money("NaN"), None);
    }

    #[test]
    fn quantity_rejects_garbage() {
        assert_eq!(parse_quantity("3"), Some(3.0));
        assert_eq!(parse_quantity("-1"), Some(-1.0));
        assert_eq!(parse_quantity("three"), None);
        assert_eq!(parse_quantity("inf"), None);
    }

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let rows = vec![
            raw("2025-01-03", "C001", "P10", "2", "12.50"),
            raw("2025-01-05", "C003", "P20", "-1", "8.00"),
            raw("2025-01-06", "C004", "P99", "2", "doce"),
            raw("bad-date", "C001", "P10", "1", "1.00"),
            raw("2025-01-07", "", "P10", "1", "1.00"),
            raw("<missing>", "C001", "P10", "1", "1.00"),
        ];
        let total = rows.len();

        let (valid, invalid) = partition(rows);
        assert_eq!(valid.len() + invalid.len(), total);
        assert_eq!(valid.len(), 1);
        assert!(valid.iter().all(|r| r.is_valid()));
        assert!(invalid.iter().all(|r| !r.is_valid()));
    }

    #[test]
    fn negative_quantity_row_is_quarantined() {
        let (valid, invalid) = partition(vec![raw("2025-01-05", "C003", "P20", "-1", "8.00")]);
        assert!(valid.is_empty());
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].quantity, Some(-1.0));
        assert_eq!(invalid[0].date, NaiveDate::from_ymd_opt(2025, 1, 5));
    }

    #[test]
    fn unparsable_price_row_is_quarantined() {
        let (valid, invalid) = partition(vec![raw("2025-01-06", "C004", "P99", "2", "doce")]);
        assert!(valid.is_empty());
        assert_eq!(invalid.len(), 1);
        assert!(invalid[0].unit_price.is_none());
    }

    #[test]
    fn comma_priced_row_is_valid() {
        let (valid, invalid) = partition(vec![raw("2025-01-04", "C001", "P20", "3", "8,00")]);
        assert!(invalid.is_empty());
        assert_eq!(valid[0].unit_price, Some(8.0));
    }
}
