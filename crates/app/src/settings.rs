use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use staging::Partition;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "config/reconcile.toml";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    /// Bearer token. Never read from the command line.
    pub token: Option<String>,
    pub level: String,
    /// Source account used when `--account` is not given.
    pub account_id: Option<i64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            token: None,
            level: "info".to_string(),
            account_id: None,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "reconcile", about = "Review and import bank CSV exports")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:8000).
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override log level.
    #[arg(long, global = true)]
    level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a file and show what would be imported.
    Preview {
        /// Account the file was exported from.
        #[arg(long)]
        account: Option<i64>,
        file: PathBuf,
    },
    /// Upload a file, apply corrections and commit.
    Import {
        #[arg(long)]
        account: Option<i64>,
        file: PathBuf,
        /// JSON list of edit/delete/new_category steps.
        #[arg(long)]
        script: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = PartitionArg::All)]
        partition: PartitionArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PartitionArg {
    Confident,
    Uncertain,
    All,
}

impl PartitionArg {
    /// Partitions to commit, confident first.
    pub fn partitions(self) -> Vec<Partition> {
        match self {
            Self::Confident => vec![Partition::Confident],
            Self::Uncertain => vec![Partition::Uncertain],
            Self::All => Partition::ALL.to_vec(),
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("RECONCILE"))
            .build()?;
        Self::from_config(config, cli)
    }

    fn from_config(config: config::Config, cli: &Cli) -> Result<Self> {
        let mut settings: Settings = config.try_deserialize()?;

        if let Some(base_url) = &cli.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(level) = &cli.level {
            settings.level = level.clone();
        }

        Ok(settings)
    }
}
