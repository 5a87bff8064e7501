//! Pipeline error type.
//!
//! Coercion and validation failures are data, not errors (they route rows to
//! quarantine). This enum covers the failures that abort a run: I/O, malformed
//! batch files, SQL asset problems, and store write errors.

use std::fmt;

#[derive(Debug)]
pub enum PipelineError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Database(rusqlite::Error),
    Parquet(parquet::errors::ParquetError),
    /// Missing or unusable configuration/SQL assets.
    Config(String),
    /// Persisted data that cannot be read back (e.g. a bad date in parquet).
    InvalidData(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(e) => write!(f, "I/O error: {}", e),
            PipelineError::Csv(e) => write!(f, "CSV error: {}", e),
            PipelineError::Json(e) => write!(f, "JSON error: {}", e),
            PipelineError::Database(e) => write!(f, "Database error: {}", e),
            PipelineError::Parquet(e) => write!(f, "Parquet error: {}", e),
            PipelineError::Config(msg) => write!(f, "Config error: {}", msg),
            PipelineError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Csv(err)
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Json(err)
    }
}

impl From<rusqlite::Error> for PipelineError {
    fn from(err: rusqlite::Error) -> Self {
        PipelineError::Database(err)
    }
}

impl From<parquet::errors::ParquetError> for PipelineError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        PipelineError::Parquet(err)
    }
}
