use std::env;
use std::path::PathBuf;

/// Configuration loaded from environment variables
pub struct Config {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub sql_dir: PathBuf,
    pub rust_log: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// All settings have defaults, so a bare `ventaflow` invocation works
    /// against the conventional directory layout.
    pub fn from_env() -> Self {
        let data_dir = env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/drops"));

        let out_dir = env::var("OUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("output"));

        let sql_dir = env::var("SQL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("sql"));

        let rust_log = env::var("RUST_LOG").ok();

        Self {
            data_dir,
            out_dir,
            sql_dir,
            rust_log,
        }
    }

    pub fn quarantine_path(&self) -> PathBuf {
        self.out_dir.join("quality").join("invalid_sales.csv")
    }

    pub fn parquet_path(&self) -> PathBuf {
        self.out_dir.join("parquet").join("clean_sales.parquet")
    }

    pub fn db_path(&self) -> PathBuf {
        self.out_dir.join("sales.db")
    }

    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join("report.md")
    }
}
