//! Record reader: heterogeneous batch files into a uniform raw row shape.
//!
//! Supported formats: CSV with a header row, and NDJSON/JSONL with one object
//! per line. Every field is read as text; type coercion happens downstream.
//! Files are processed sorted by name so a run is deterministic.

use crate::error::PipelineError;
use crate::record::{RawRecord, RunContext};
use csv::StringRecord;
use std::collections::HashMap;
use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const COLUMNS: [&str; 5] = ["date", "customer_id", "product_id", "quantity", "unit_price"];

/// Read every supported batch file under `data_dir` into raw records.
///
/// Rows are stamped with the file name and the run's single ingest timestamp.
/// A missing or empty directory yields an empty collection, never an error.
pub fn read_batch_dir(data_dir: &Path, ctx: &RunContext) -> Result<Vec<RawRecord>, PipelineError> {
    let files = discover_batch_files(data_dir)?;

    let mut rows = Vec::new();
    for path in &files {
        let file_rows = read_batch_file(path, ctx)?;
        log::debug!("   ├─ {}: {} rows", path.display(), file_rows.len());
        rows.extend(file_rows);
    }

    log::info!("📥 Ingested {} rows from {} files", rows.len(), files.len());
    Ok(rows)
}

/// Discover `*.csv`, `*.ndjson` and `*.jsonl` files, sorted by file name.
fn discover_batch_files(data_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !data_dir.exists() {
        log::warn!("⚠️  Data directory not found: {}", data_dir.display());
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("csv") | Some("ndjson") | Some("jsonl")
            )
        })
        .collect();

    files.sort_by_key(|path| path.file_name().map(|n| n.to_os_string()));
    Ok(files)
}

fn read_batch_file(path: &Path, ctx: &RunContext) -> Result<Vec<RawRecord>, PipelineError> {
    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match path.extension().and_then(|s| s.to_str()) {
        Some("csv") => read_csv(path, &source_file, ctx),
        Some("ndjson") | Some("jsonl") => read_ndjson(path, &source_file, ctx),
        other => Err(PipelineError::Config(format!(
            "unsupported batch file extension: {:?}",
            other
        ))),
    }
}

fn read_csv(path: &Path, source_file: &str, ctx: &RunContext) -> Result<Vec<RawRecord>, PipelineError> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let header_map = build_header_map(reader.headers()?);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(RawRecord {
            date: get_field(&record, &header_map, COLUMNS[0]),
            customer_id: get_field(&record, &header_map, COLUMNS[1]),
            product_id: get_field(&record, &header_map, COLUMNS[2]),
            quantity: get_field(&record, &header_map, COLUMNS[3]),
            unit_price: get_field(&record, &header_map, COLUMNS[4]),
            source_file: source_file.to_string(),
            ingest_ts: ctx.ingest_ts(),
        });
    }
    Ok(rows)
}

fn read_ndjson(
    path: &Path,
    source_file: &str,
    ctx: &RunContext,
) -> Result<Vec<RawRecord>, PipelineError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line)?;
        rows.push(RawRecord {
            date: get_json_field(&value, COLUMNS[0]),
            customer_id: get_json_field(&value, COLUMNS[1]),
            product_id: get_json_field(&value, COLUMNS[2]),
            quantity: get_json_field(&value, COLUMNS[3]),
            unit_price: get_json_field(&value, COLUMNS[4]),
            source_file: source_file.to_string(),
            ingest_ts: ctx.ingest_ts(),
        });
    }
    Ok(rows)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        // Strip a possible UTF-8 BOM on the first header so column lookup
        // does not silently miss it.
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), idx))
        .collect()
}

/// `None` when the file does not carry the column at all; the raw value
/// (possibly empty) otherwise. Extra columns are ignored.
fn get_field(record: &StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<String> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(|s| s.trim().to_string())
}

/// Fields are read as text whatever their JSON type; null and missing both
/// map to `None`.
fn get_json_field(value: &serde_json::Value, name: &str) -> Option<String> {
    match value.get(name) {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::tempdir;

    fn test_ctx() -> RunContext {
        RunContext::at(Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap())
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn empty_directory_yields_no_rows() {
        let dir = tempdir().unwrap();
        let rows = read_batch_dir(dir.path(), &test_ctx()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_directory_yields_no_rows() {
        let dir = tempdir().unwrap();
        let rows = read_batch_dir(&dir.path().join("nope"), &test_ctx()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn reads_csv_rows_with_provenance() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "sales.csv",
            "date,customer_id,product_id,quantity,unit_price\n\
             2025-01-03,C001,P10,2,12.50\n\
             2025-01-04,C002,P10,1,12.50\n",
        );

        let ctx = test_ctx();
        let rows = read_batch_dir(dir.path(), &ctx).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date.as_deref(), Some("2025-01-03"));
        assert_eq!(rows[0].customer_id.as_deref(), Some("C001"));
        assert_eq!(rows[0].unit_price.as_deref(), Some("12.50"));
        assert_eq!(rows[0].source_file, "sales.csv");
        assert_eq!(rows[0].ingest_ts, ctx.ingest_ts());
        assert_eq!(rows[1].ingest_ts, rows[0].ingest_ts);
    }

    #[test]
    fn csv_missing_columns_become_none() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "partial.csv",
            "date,customer_id,extra\n2025-01-03,C001,whatever\n",
        );

        let rows = read_batch_dir(dir.path(), &test_ctx()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date.as_deref(), Some("2025-01-03"));
        assert!(rows[0].product_id.is_none());
        assert!(rows[0].quantity.is_none());
        assert!(rows[0].unit_price.is_none());
    }

    #[test]
    fn reads_ndjson_with_numeric_fields_as_text() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "sales.ndjson",
            "{\"date\":\"2025-01-04\",\"customer_id\":\"C001\",\"product_id\":\"P20\",\"quantity\":3,\"unit_price\":\"8,00\"}\n\
             \n\
             {\"date\":\"2025-01-05\",\"customer_id\":null,\"product_id\":\"P20\",\"quantity\":\"1\",\"unit_price\":8.0}\n",
        );

        let rows = read_batch_dir(dir.path(), &test_ctx()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].quantity.as_deref(), Some("3"));
        assert_eq!(rows[0].unit_price.as_deref(), Some("8,00"));
        assert!(rows[1].customer_id.is_none());
        assert_eq!(rows[1].unit_price.as_deref(), Some("8.0"));
    }

    #[test]
    fn files_are_read_sorted_by_name() {
        let dir = tempdir().unwrap();
        write_file(
            dir.path(),
            "b.csv",
            "date,customer_id,product_id,quantity,unit_price\n2025-01-04,C2,P1,1,1\n",
        );
        write_file(
            dir.path(),
            "a.csv",
            "date,customer_id,product_id,quantity,unit_price\n2025-01-03,C1,P1,1,1\n",
        );
        write_file(dir.path(), "notes.txt", "ignored\n");

        let rows = read_batch_dir(dir.path(), &test_ctx()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source_file, "a.csv");
        assert_eq!(rows[1].source_file, "b.csv");
    }
}
