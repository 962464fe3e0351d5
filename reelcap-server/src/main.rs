use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use reelcap_common::observability::init_logging;
use reelcap_server::cli::{Cli, Command};
use reelcap_server::tether::build_from_config;

const APP_NAME: &str = "reelcap";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1) Load config (CLI > PORT > REELCAP_* env > file > defaults)
    let cfg = cli.load_config()?;

    let log_path = init_logging(cfg.logging.to_log_config(APP_NAME))?;
    tracing::debug!(log_path = %log_path.display(), "logging initialised");

    let tether = build_from_config(&cfg)?;

    match cli.command() {
        Command::Serve => {
            tether.run().await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Extract { url } => {
            let result = tether.extract_once(&url).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
