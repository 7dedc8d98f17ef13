//! img10 CLI binary.
//!
//! Operator access to the ingestion pipeline:
//! - Ingest files and report their renditions
//! - Fetch, inspect and invalidate renditions
//! - Report stats, health and purge expired assets

use clap::Parser;
use img10::observability::{LoggingConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, LogFormat, execute};

    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut logging = LoggingConfig::new().with_json_logs(cli.log_format == LogFormat::Json);
    if cli.verbose {
        logging = logging.with_log_level("debug");
    }
    init_logging(&logging)?;

    execute(cli).await?;

    Ok(())
}
