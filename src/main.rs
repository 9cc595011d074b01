/// Dropper command line entry point
mod cli;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use dropper_tools::{init_tracing, ConfigManager, Environment};
use tracing::{debug, error, warn};

use crate::cli::Commands;

#[derive(Parser, Debug)]
#[command(name = "dropper")]
#[command(author, version, about = "Create, sign and redeem Dropper claims", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = "dropper.toml")]
    config: PathBuf,

    /// Environment whose configuration to load (development, staging, production, test)
    #[arg(short, long, global = true, env = "DROPPER_ENVIRONMENT", default_value = "development")]
    environment: Environment,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = ConfigManager::load_for_environment(&cli.config, cli.environment.clone())?;
    init_tracing(&manager.config().logging)?;
    debug!(config = %manager.config_path().display(), environment = %cli.environment, "Loaded configuration");

    for warning in manager.warnings() {
        warn!("{}", warning);
    }

    // `config validate` reports problems instead of refusing to start
    if !matches!(cli.command, Commands::Config(_)) {
        if let Err(errors) = manager.validate() {
            for error in &errors {
                error!("{}", error);
            }
            bail!("Invalid configuration ({} errors)", errors.len());
        }
    }

    let output = match cli::run(&manager, cli.command).await {
        Ok(output) => output,
        Err(err) => {
            match err.downcast_ref::<dropper_common::Error>() {
                Some(rejection) if rejection.is_rejection() => warn!("Rejected: {}", rejection),
                _ => error!("{:#}", err),
            }
            return Err(err);
        }
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from([
            "dropper", "dropper", "num-claims", "--network", "development", "--config", "custom.toml",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert!(matches!(cli.command, Commands::Dropper(_)));
    }

    #[test]
    fn test_environment_flag() {
        let cli = Cli::try_parse_from(["dropper", "-e", "prod", "config", "validate"]).unwrap();
        assert_eq!(cli.environment, Environment::Production);
    }
}
