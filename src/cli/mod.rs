//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! favro-export binary.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::client::DEFAULT_API_URL;

/// Export a Favro account to local files.
#[derive(Parser, Debug)]
#[command(
    name = "favro-export",
    about = "Exports your organizations' data from Favro into local files",
    version
)]
pub struct Cli {
    /// Directory the export is written to.
    #[arg(short, long)]
    pub destination: PathBuf,

    /// Favro account email.
    #[arg(long, env = "FAVRO_USER")]
    pub user: Option<String>,

    /// Favro API token.
    #[arg(long, env = "FAVRO_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the Favro API.
    #[arg(long, env = "FAVRO_API_URL", default_value = DEFAULT_API_URL)]
    pub base_url: String,

    /// Only export this organization.
    #[arg(long, env = "FAVRO_ORGANIZATION_ID")]
    pub organization: Option<String>,

    /// Keep existing files in the destination instead of emptying it.
    #[arg(long, default_value = "false")]
    pub no_clean: bool,

    /// Print the run summary as JSON instead of a table.
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log level selected by the verbosity flag.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
