use anyhow::Result;
use clap::Parser;

mod cli;

use cli::commands::{config::ConfigCommand, export::ExportCommand, scenario::ScenarioCommand};
use cli::{Cli, Commands};
use stockflow::{init_telemetry, StockflowConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            StockflowConfig::load_env_file()?;
            StockflowConfig::load_from(path)?
        }
        None => stockflow::config()?.clone(),
    };
    init_telemetry(&config.observability)?;

    match cli.command {
        // No subcommand: explain how to get started
        None => tokio::runtime::Runtime::new()?.block_on(async {
            cli::commands::show_usage().await
        }),
        Some(Commands::Scenario { file, audit }) => {
            tokio::runtime::Runtime::new()?.block_on(async {
                ScenarioCommand::new(file)
                    .with_audit(audit)
                    .execute(&config)
                    .await
            })
        }
        Some(Commands::Export { file, kind }) => {
            tokio::runtime::Runtime::new()?.block_on(async {
                ExportCommand::new(file, kind).execute(&config).await
            })
        }
        Some(Commands::Config { output }) => ConfigCommand::new(output).execute(&config),
    }
}
