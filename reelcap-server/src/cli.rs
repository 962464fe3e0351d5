use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reelcap_common::ReelcapError;
use reelcap_config::{ReelcapConfig, ReelcapConfigLoader};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "reelcap.yaml";

#[derive(Debug, Parser)]
#[command(name = "reelcap")]
#[command(about = "Extract Instagram post and reel captions over HTTP")]
#[command(version)]
pub struct Cli {
    /// YAML config file; defaults to ./reelcap.yaml when present
    #[arg(long, short, global = true, env = "REELCAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen port, overriding config and PORT
    #[arg(long, short, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Extract one caption, print the JSON result and exit
    Extract { url: String },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// Load configuration for this invocation; CLI flags win over everything.
    pub fn load_config(&self) -> Result<ReelcapConfig, ReelcapError> {
        let loader = match &self.config {
            Some(path) => ReelcapConfigLoader::new().with_file(path),
            None => ReelcapConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE),
        };
        let mut config = loader
            .load()
            .map_err(|e| ReelcapError::Config(e.to_string()))?;
        if let Some(port) = self.port {
            config.server.port = port;
        }
        Ok(config)
    }
}
