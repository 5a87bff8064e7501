//! Pipeline orchestration: one strictly sequential batch run.
//!
//! Reader → Coercion/Validation → Deduplicator → Persistence → Reporting.
//! Each stage fully materializes its output before the next begins. The
//! report is always derived from the analytical store re-read from disk,
//! never from the in-memory clean set.

use crate::config::Config;
use crate::db::{SalesDb, SqlAssets};
use crate::error::PipelineError;
use crate::record::RunContext;
use crate::report::{render, AggregateReport, RowCounts};
use crate::{coerce, dedup, parquet_store, quality, reader};
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

/// Outcome of one run, for the CLI confirmation lines.
#[derive(Debug)]
pub struct RunSummary {
    pub report_path: PathBuf,
    /// `None` when there was no clean data to write this run.
    pub parquet_path: Option<PathBuf>,
    pub db_path: PathBuf,
    pub counts: RowCounts,
}

/// Run the full pipeline to completion.
pub fn run(config: &Config) -> Result<RunSummary, PipelineError> {
    let ctx = RunContext::now();
    log::info!("🚀 Starting ingestion run {}", ctx.batch_id);

    // 1. Ingestion
    let raw = reader::read_batch_dir(&config.data_dir, &ctx)?;
    let bronze = raw.len();

    // 2. Coercion + validation + dedup. The valid set is kept around: the
    // raw history table receives every coerced row, pre-dedup.
    let (valid, invalid) = coerce::partition(raw);
    let clean = dedup::deduplicate(valid.clone());
    let counts = RowCounts {
        bronze,
        silver: clean.len(),
        quarantined: invalid.len(),
    };

    // 3. Persistence: quarantine, then parquet, then sqlite. The two stores
    // are written in sequence, not two-phase committed.
    quality::write_quarantine(&invalid, &config.quarantine_path())?;

    let parquet_path = config.parquet_path();
    let wrote_parquet = if clean.is_empty() {
        log::info!("📭 No clean rows this run; analytical store left untouched");
        false
    } else {
        parquet_store::write_clean(&clean, &parquet_path)?;
        true
    };

    {
        let assets = SqlAssets::load(&config.sql_dir)?;
        let db = SalesDb::open(&config.db_path())?;
        db.apply_schema(&assets)?;

        let mut coerced_all = valid;
        coerced_all.extend(invalid);
        db.append_raw(&coerced_all, &ctx)?;

        db.upsert_clean(&clean, &assets)?;
        db.apply_views(&assets)?;
        // Connection dropped here, before reporting begins.
    }

    // 4. Reporting, strictly from the durable analytical store.
    let persisted = parquet_store::read_clean(&parquet_path)?;
    let report = AggregateReport::compute(&persisted);
    let text = render(&report, counts, &parquet_path, &config.db_path(), Utc::now());

    let report_path = config.report_path();
    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&report_path, text)?;
    log::info!("📝 Report written to {}", report_path.display());

    Ok(RunSummary {
        report_path,
        parquet_path: wrote_parquet.then_some(parquet_path),
        db_path: config.db_path(),
        counts,
    })
}
