//! Transactional store: SQLite with externally supplied SQL assets.
//!
//! The schema DDL, the parameterized upsert and the view DDL are opaque
//! contracts loaded from the SQL directory and applied verbatim, in that
//! order. Any statement failure aborts the run; there is no per-row recovery
//! and no rollback of what was already written.

use crate::error::PipelineError;
use crate::record::{CleanRecord, CoercedRecord, RunContext};
use rusqlite::{named_params, params, Connection};
use std::fs;
use std::path::Path;

/// The three external SQL texts, loaded once per run.
///
/// Keeping them as named fields (rather than a directory scan) makes the
/// persistence contract explicit: schema first, then upserts, then views.
pub struct SqlAssets {
    pub schema: String,
    pub upsert: String,
    pub views: String,
}

impl SqlAssets {
    pub const SCHEMA_FILE: &'static str = "00_schema.sql";
    pub const UPSERT_FILE: &'static str = "10_upserts.sql";
    pub const VIEWS_FILE: &'static str = "20_views.sql";

    pub fn load(sql_dir: &Path) -> Result<Self, PipelineError> {
        let read = |name: &str| -> Result<String, PipelineError> {
            let path = sql_dir.join(name);
            fs::read_to_string(&path).map_err(|e| {
                PipelineError::Config(format!("cannot read SQL asset {}: {}", path.display(), e))
            })
        };

        Ok(Self {
            schema: read(Self::SCHEMA_FILE)?,
            upsert: read(Self::UPSERT_FILE)?,
            views: read(Self::VIEWS_FILE)?,
        })
    }
}

/// One connection for the duration of the persistence stage.
pub struct SalesDb {
    conn: Connection,
}

impl SalesDb {
    pub fn open(db_path: &Path) -> Result<Self, PipelineError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Ok(Self { conn })
    }

    /// Bootstrap the schema. The DDL uses `IF NOT EXISTS` clauses, so this is
    /// safe to re-run against an existing database.
    pub fn apply_schema(&self, assets: &SqlAssets) -> Result<(), PipelineError> {
        self.conn.execute_batch(&assets.schema)?;
        log::info!("🔧 Applied schema DDL");
        Ok(())
    }

    /// Append every coerced row (valid and invalid alike) to the raw history
    /// table with the run's batch identifier. Append-only, never deduplicated.
    pub fn append_raw(&self, coerced: &[CoercedRecord], ctx: &RunContext) -> Result<(), PipelineError> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO raw_sales (date, customer_id, product_id, quantity, unit_price,
                                    ingest_ts, source_file, batch_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for row in coerced {
            stmt.execute(params![
                row.date.map(|d| d.to_string()),
                row.customer_id,
                row.product_id,
                row.quantity,
                row.unit_price,
                row.ingest_ts,
                row.source_file,
                ctx.batch_id,
            ])?;
        }

        log::info!("🗃️  Appended {} raw rows (batch {})", coerced.len(), ctx.batch_id);
        Ok(())
    }

    /// Apply the external upsert to every clean record.
    ///
    /// The statement is keyed on (date, customer_id, product_id) with
    /// insert-or-replace semantics: applying the same record twice leaves the
    /// stored row identical to applying it once.
    pub fn upsert_clean(&self, clean: &[CleanRecord], assets: &SqlAssets) -> Result<(), PipelineError> {
        let mut stmt = self.conn.prepare(&assets.upsert)?;

        for rec in clean {
            stmt.execute(named_params! {
                ":fecha": rec.date.to_string(),
                ":idc": rec.customer_id,
                ":idp": rec.product_id,
                ":u": rec.quantity,
                ":p": rec.unit_price,
                ":ts": rec.ingest_ts,
            })?;
        }

        log::info!("✅ Upserted {} clean rows", clean.len());
        Ok(())
    }

    /// Materialize the daily rollup view from the external view DDL.
    pub fn apply_views(&self, assets: &SqlAssets) -> Result<(), PipelineError> {
        self.conn.execute_batch(&assets.views)?;
        log::info!("🔭 Applied view DDL");
        Ok(())
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
