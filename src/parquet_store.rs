//! Analytical store: the clean set as a Parquet file.
//!
//! The file is rewritten wholesale on each run and is the single source of
//! truth the reporting engine reads back from. Reporting never sees the
//! in-memory clean set.

use crate::error::PipelineError;
use crate::record::CleanRecord;
use chrono::NaiveDate;
use parquet::{
    basic::{Compression, ConvertedType, Repetition, Type as PhysicalType},
    column::writer::ColumnWriter,
    data_type::ByteArray,
    errors::ParquetError,
    file::{
        properties::WriterProperties,
        reader::{FileReader, SerializedFileReader},
        writer::SerializedFileWriter,
    },
    record::RowAccessor,
    schema::types::Type,
};
use std::fs;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

// Column order is fixed; the reader indexes by position.
const COL_DATE: usize = 0;
const COL_CUSTOMER: usize = 1;
const COL_PRODUCT: usize = 2;
const COL_QUANTITY: usize = 3;
const COL_UNIT_PRICE: usize = 4;
const COL_AMOUNT: usize = 5;
const COL_INGEST_TS: usize = 6;

fn clean_schema() -> Result<Arc<Type>, ParquetError> {
    let utf8 = |name: &str| -> Result<Arc<Type>, ParquetError> {
        Ok(Arc::new(
            Type::primitive_type_builder(name, PhysicalType::BYTE_ARRAY)
                .with_converted_type(ConvertedType::UTF8)
                .with_repetition(Repetition::REQUIRED)
                .build()?,
        ))
    };
    let double = |name: &str| -> Result<Arc<Type>, ParquetError> {
        Ok(Arc::new(
            Type::primitive_type_builder(name, PhysicalType::DOUBLE)
                .with_repetition(Repetition::REQUIRED)
                .build()?,
        ))
    };

    Ok(Arc::new(
        Type::group_type_builder("clean_sales")
            .with_fields(vec![
                utf8("date")?,
                utf8("customer_id")?,
                utf8("product_id")?,
                double("quantity")?,
                double("unit_price")?,
                double("amount")?,
                utf8("ingest_ts")?,
            ])
            .build()?,
    ))
}

/// Write the clean set, replacing any prior file content.
///
/// Callers skip the write when the clean set is empty; the previous file (if
/// any) is left in place, matching the store's replace-on-nonempty contract.
pub fn write_clean(clean: &[CleanRecord], path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let schema = clean_schema()?;
    let props = Arc::new(
        WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build(),
    );

    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, schema, props)?;
    let mut row_group = writer.next_row_group()?;

    let mut col_idx = 0usize;
    while let Some(mut column) = row_group.next_column()? {
        match column.untyped() {
            ColumnWriter::ByteArrayColumnWriter(typed) => {
                let values: Vec<ByteArray> = match col_idx {
                    COL_DATE => clean.iter().map(|r| r.date.to_string().into_bytes().into()).collect(),
                    COL_CUSTOMER => clean.iter().map(|r| r.customer_id.as_str().into()).collect(),
                    COL_PRODUCT => clean.iter().map(|r| r.product_id.as_str().into()).collect(),
                    COL_INGEST_TS => clean.iter().map(|r| r.ingest_ts.as_str().into()).collect(),
                    other => {
                        return Err(ParquetError::General(format!(
                            "unexpected byte-array column at index {}",
                            other
                        ))
                        .into())
                    }
                };
                typed.write_batch(&values, None, None)?;
            }
            ColumnWriter::DoubleColumnWriter(typed) => {
                let values: Vec<f64> = match col_idx {
                    COL_QUANTITY => clean.iter().map(|r| r.quantity).collect(),
                    COL_UNIT_PRICE => clean.iter().map(|r| r.unit_price).collect(),
                    COL_AMOUNT => clean.iter().map(|r| r.amount).collect(),
                    other => {
                        return Err(ParquetError::General(format!(
                            "unexpected double column at index {}",
                            other
                        ))
                        .into())
                    }
                };
                typed.write_batch(&values, None, None)?;
            }
            _ => {
                return Err(ParquetError::General("unexpected column type in clean schema".to_string()).into())
            }
        }
        column.close()?;
        col_idx += 1;
    }

    row_group.close()?;
    writer.close()?;

    log::info!("💾 Wrote {} clean rows to {}", clean.len(), path.display());
    Ok(())
}

/// Read the clean set back from disk. A missing file is the zero-data case,
/// not an error.
pub fn read_clean(path: &Path) -> Result<Vec<CleanRecord>, PipelineError> {
    if !path.exists() {
        log::info!("📭 No analytical store at {}", path.display());
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file)?;

    let mut records = Vec::new();
    for row in reader.get_row_iter(None)? {
        let row = row?;
        let date_str = row.get_string(COL_DATE)?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
            PipelineError::InvalidData(format!("bad date '{}' in analytical store: {}", date_str, e))
        })?;

        records.push(CleanRecord {
            date,
            customer_id: row.get_string(COL_CUSTOMER)?.clone(),
            product_id: row.get_string(COL_PRODUCT)?.clone(),
            quantity: row.get_double(COL_QUANTITY)?,
            unit_price: row.get_double(COL_UNIT_PRICE)?,
            amount: row.get_double(COL_AMOUNT)?,
            ingest_ts: row.get_string(COL_INGEST_TS)?.clone(),
        });
    }

    log::debug!("📖 Read {} clean rows from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record(product: &str, quantity: f64, unit_price: f64) -> CleanRecord {
        CleanRecord {
            date: NaiveDate::from_ymd_opt(2025, 1, 3).unwrap(),
            customer_id: "C001".to_string(),
            product_id: product.to_string(),
            quantity,
            unit_price,
            amount: quantity * unit_price,
            ingest_ts: "2025-01-10T08:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let rows = read_clean(&dir.path().join("absent.parquet")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn written_rows_read_back_typed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("parquet").join("clean_sales.parquet");

        let clean = vec![sample_record("P10", 2.0, 12.5), sample_record("P20", 3.0, 8.0)];
        write_clean(&clean, &path).unwrap();

        let read = read_clean(&path).unwrap();
        assert_eq!(read, clean);
    }

    #[test]
    fn rewrite_replaces_prior_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clean_sales.parquet");

        write_clean(&[sample_record("P10", 2.0, 12.5), sample_record("P20", 1.0, 8.0)], &path)
            .unwrap();
        write_clean(&[sample_record("P99", 1.0, 5.0)], &path).unwrap();

        let read = read_clean(&path).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].product_id, "P99");
    }
}
