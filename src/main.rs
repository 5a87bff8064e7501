use ventaflow::config::Config;
use ventaflow::pipeline;

fn main() {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    // Initialize logger (stderr, RUST_LOG-driven, info by default)
    let mut builder = if config.rust_log.is_some() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
    };
    builder.target(env_logger::Target::Stderr).init();

    match pipeline::run(&config) {
        Ok(summary) => {
            println!("OK · Report : {}", summary.report_path.display());
            match summary.parquet_path {
                Some(path) => println!("OK · Parquet: {}", path.display()),
                None => println!("OK · Parquet: no data"),
            }
            println!("OK · SQLite : {}", summary.db_path.display());
        }
        Err(e) => {
            log::error!("❌ Pipeline run failed: {}", e);
            eprintln!("Pipeline run failed: {}", e);
            std::process::exit(1);
        }
    }
}
