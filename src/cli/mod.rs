use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stockflow::ReportKind;

pub mod commands;

#[derive(Parser)]
#[command(name = "stockflow")]
#[command(about = "Multi-branch pharmacy stock workflows")]
#[command(long_about = "Stockflow runs requisition, transfer, release and disposal workflows \
                       against in-memory collaborators. Script a run with 'stockflow scenario <file>' \
                       and export the resulting records with 'stockflow export <file>'.")]
pub struct Cli {
    /// Configuration file (defaults to stockflow.toml in the working directory)
    #[arg(long, global = true, help = "Path to a stockflow.toml configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scripted scenario and print each step's outcome and the final ledger
    Scenario {
        /// Scenario file (TOML)
        file: PathBuf,
        /// Print the audit trail after the run
        #[arg(long, help = "Show every audit entry recorded during the run")]
        audit: bool,
    },
    /// Run a scenario and print its records as CSV, one row per line item
    Export {
        /// Scenario file (TOML)
        file: PathBuf,
        /// Which records to export
        #[arg(long, value_enum, default_value = "all", help = "Limit the export to one workflow")]
        kind: ReportKind,
    },
    /// Print the effective configuration
    Config {
        /// Write the configuration to this file instead of stdout
        #[arg(long, help = "Save the effective configuration as TOML")]
        output: Option<PathBuf>,
    },
}
