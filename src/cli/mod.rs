//! Command-line interface for near-fees.

pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use crate::domain::errors::{CredentialError, WarehouseError};
use crate::infrastructure::config::ConfigError;
use crate::infrastructure::logging::SecretScrubber;

pub use context::AppContext;

#[derive(Parser, Debug)]
#[command(name = "near-fees")]
#[command(about = "NEAR Intents fee reports from Snowflake", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (replaces .near-fees/config.yaml and local.yaml)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the credential configuration and test the warehouse connection
    Check(commands::check::CheckArgs),

    /// Run ad-hoc SQL
    Query(commands::query::QueryArgs),

    /// Run one of the dashboard reports
    Report(commands::report::ReportArgs),
}

/// Print an error as `Kind: message` (or a JSON object) and exit with status 1.
///
/// The message is scrubbed of key material and tokens first.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if err.is::<commands::check::CheckFailed>() {
        // Already reported in the command's own output
        std::process::exit(1);
    }

    let kind = error_kind(&err);
    let message = SecretScrubber::global().scrub_message(&format!("{err:#}"));

    if json_mode {
        let body = json!({ "error": { "kind": kind, "message": message } });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{}: {message}", console::style(kind).red().bold());
    }
    std::process::exit(1);
}

/// Stable error kind name for the innermost typed error in the chain.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<WarehouseError>()
                .map(WarehouseError::kind)
                .or_else(|| cause.downcast_ref::<CredentialError>().map(CredentialError::kind))
                .or_else(|| cause.downcast_ref::<ConfigError>().map(|_| "ConfigError"))
        })
        .unwrap_or("Error")
}
