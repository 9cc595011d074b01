//! Command line surface: one subcommand group per contract binding
pub mod args;
pub mod dropper;
pub mod erc20;
pub mod erc721;
pub mod terminus;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use dropper_ethereum::{
    load_keystore, ContractArtifact, EthereumProvider, EthereumProviderConfig, SignerClient,
    TransactionConfig,
};
use dropper_tools::{ConfigManager, DropperConfig};
use ethers::types::{Address, U256};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use self::args::{NetworkArgs, TransactArgs};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interact with the Dropper claim contract
    #[command(subcommand)]
    Dropper(dropper::DropperCommand),

    /// Interact with the MockErc20 contract
    #[command(subcommand)]
    MockErc20(erc20::Erc20Command),

    /// Interact with the MockERC721 contract
    #[command(subcommand)]
    MockErc721(erc721::Erc721Command),

    /// Interact with the MockTerminus contract
    #[command(subcommand)]
    Terminus(terminus::TerminusCommand),

    /// Manage the CLI configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default configuration file
    Init {
        /// Output file path (.toml, .json, .yaml)
        #[arg(long, default_value = "dropper.toml")]
        output: PathBuf,
    },

    /// Validate the loaded configuration
    Validate,

    /// Print the effective configuration, after environment overrides
    Show,
}

/// Execute one parsed command and return its JSON result
pub async fn run(manager: &ConfigManager, command: Commands) -> Result<Value> {
    let config = manager.config();
    match command {
        Commands::Dropper(cmd) => dropper::run(config, cmd).await,
        Commands::MockErc20(cmd) => erc20::run(config, cmd).await,
        Commands::MockErc721(cmd) => erc721::run(config, cmd).await,
        Commands::Terminus(cmd) => terminus::run(config, cmd).await,
        Commands::Config(cmd) => run_config(manager, cmd),
    }
}

fn run_config(manager: &ConfigManager, command: ConfigCommand) -> Result<Value> {
    match command {
        ConfigCommand::Init { output } => {
            ConfigManager::generate_default_config(&output, manager.config().environment.clone())?;
            Ok(json!({ "written": output }))
        }
        ConfigCommand::Validate => {
            let errors: Vec<String> = match manager.validate() {
                Ok(()) => Vec::new(),
                Err(errors) => errors.iter().map(ToString::to_string).collect(),
            };
            Ok(json!({
                "valid": errors.is_empty(),
                "errors": errors,
                "warnings": manager.warnings(),
            }))
        }
        ConfigCommand::Show => Ok(serde_json::to_value(manager.config())?),
    }
}

/// Read-only connection to the named network
pub(crate) fn provider_for(config: &DropperConfig, network: &str) -> Result<EthereumProvider> {
    let network_config = config.network(network)?;
    let provider = EthereumProvider::new(EthereumProviderConfig {
        rpc_url: network_config.rpc_url.clone(),
        chain_id: network_config.chain_id,
        request_timeout_secs: network_config.request_timeout_secs,
        poll_interval_ms: network_config.poll_interval_ms,
    })?;
    debug!(network, rpc_url = %network_config.rpc_url, "Connecting");
    Ok(provider)
}

/// `--address`, or the deployment of `contract` recorded for the network
pub(crate) fn contract_address(
    config: &DropperConfig,
    args: &NetworkArgs,
    contract: &str,
) -> Result<Option<Address>> {
    if let Some(address) = args.address {
        return Ok(Some(address));
    }
    config
        .contract_address(&args.network, contract)
        .map(|raw| {
            raw.parse::<Address>().with_context(|| {
                format!("Invalid {} address '{}' configured for network {}", contract, raw, args.network)
            })
        })
        .transpose()
}

/// Signing client for `--sender` plus the transaction overrides
pub(crate) async fn signer_for(
    config: &DropperConfig,
    args: &TransactArgs,
) -> Result<(Arc<SignerClient>, TransactionConfig)> {
    let network_config = config.network(&args.network.network)?;
    let tx_config = args.transaction_config(network_config.confirmations);
    tx_config.validate()?;

    let wallet = load_keystore(&args.sender, args.password.as_deref())?;
    let client = provider_for(config, &args.network.network)?.signer(wallet).await?;
    Ok((client, tx_config))
}

/// Compiled artifact of `contract` from the configured build directory
pub(crate) fn artifact(config: &DropperConfig, contract: &str) -> Result<ContractArtifact> {
    Ok(ContractArtifact::load(&config.build_dir, contract)?)
}

pub(crate) fn uint(value: U256) -> Value {
    Value::String(value.to_string())
}

pub(crate) fn address(value: Address) -> Value {
    Value::String(format!("{:?}", value))
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
