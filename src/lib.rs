//! ventaflow - batch sales ingestion pipeline
//!
//! Ingests heterogeneous batch files (CSV, NDJSON/JSONL), coerces and
//! validates rows, deduplicates on the natural sale key, persists to a
//! quarantine CSV, a Parquet analytical store and a SQLite transactional
//! store, and renders an aggregate Markdown report re-derived from the
//! analytical store.
//!
//! # Architecture
//!
//! ```text
//! data/drops/*.{csv,ndjson,jsonl}
//!     ↓ reader           (raw rows, stamped with source file + ingest ts)
//!     ↓ coerce           (typed fields; valid / invalid partition)
//!     ↓ dedup            (keep-last per (date, customer_id, product_id))
//!     ↓ quality | parquet_store | db   (quarantine, columnar, sqlite)
//!     ↓ report           (KPIs re-read from the parquet file)
//! output/report.md
//! ```

pub mod coerce;
pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod parquet_store;
pub mod pipeline;
pub mod quality;
pub mod reader;
pub mod record;
pub mod report;

pub use error::PipelineError;
pub use record::{CleanRecord, CoercedRecord, RawRecord, RunContext};
