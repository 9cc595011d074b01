//! `dropper terminus ...`
use anyhow::{anyhow, Result};
use clap::Subcommand;
use dropper_ethereum::tokens::TERMINUS_ARTIFACT;
use dropper_ethereum::TerminusClient;
use dropper_tools::DropperConfig;
use ethers::providers::Middleware;
use ethers::types::{Address, Bytes, U256};
use serde_json::{json, Value};
use tracing::info;

use super::args::{parse_address, parse_bool, parse_bytes, parse_u256, NetworkArgs, TransactArgs};
use super::{address, artifact, contract_address, provider_for, signer_for, to_json, uint};

#[derive(Subcommand, Debug)]
pub enum TerminusCommand {
    /// Deploy a new MockTerminus; the sender becomes its controller
    Deploy {
        #[command(flatten)]
        tx: TransactArgs,
    },

    SetPaymentToken {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        payment_token: Address,
    },

    PaymentToken {
        #[command(flatten)]
        target: NetworkArgs,
    },

    SetPoolBasePrice {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        base_price: U256,
    },

    PoolBasePrice {
        #[command(flatten)]
        target: NetworkArgs,
    },

    CreateSimplePool {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        capacity: U256,
    },

    CreatePoolV1 {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        capacity: U256,

        #[arg(long, value_parser = parse_bool, action = clap::ArgAction::Set)]
        transferable: bool,

        #[arg(long, value_parser = parse_bool, action = clap::ArgAction::Set)]
        burnable: bool,
    },

    TotalPools {
        #[command(flatten)]
        target: NetworkArgs,
    },

    /// Hand control of a pool (e.g. to a Dropper) to another address
    SetPoolController {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,

        #[arg(long, value_parser = parse_address)]
        controller: Address,
    },

    TerminusPoolController {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,
    },

    TerminusPoolCapacity {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,
    },

    TerminusPoolSupply {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,
    },

    TerminusController {
        #[command(flatten)]
        target: NetworkArgs,
    },

    Mint {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,

        #[arg(long, value_parser = parse_bytes, default_value = "0x")]
        data: Bytes,
    },

    Burn {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        from: Address,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },

    BalanceOf {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_address)]
        account: Address,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,
    },

    SetApprovalForAll {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        operator: Address,

        #[arg(long, value_parser = parse_bool, action = clap::ArgAction::Set)]
        approved: bool,
    },

    IsApprovedForAll {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_address)]
        account: Address,

        #[arg(long, value_parser = parse_address)]
        operator: Address,
    },

    ApproveForPool {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,

        #[arg(long, value_parser = parse_address)]
        operator: Address,
    },

    IsApprovedForPool {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,

        #[arg(long, value_parser = parse_address)]
        operator: Address,
    },

    SafeTransferFrom {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        from: Address,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,

        #[arg(long, value_parser = parse_bytes, default_value = "0x")]
        data: Bytes,
    },

    Uri {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,
    },

    SetUri {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        pool_id: U256,

        #[arg(long)]
        pool_uri: String,
    },
}

impl TerminusCommand {
    fn target(&self) -> &NetworkArgs {
        match self {
            TerminusCommand::PaymentToken { target }
            | TerminusCommand::PoolBasePrice { target }
            | TerminusCommand::TotalPools { target }
            | TerminusCommand::TerminusPoolController { target, .. }
            | TerminusCommand::TerminusPoolCapacity { target, .. }
            | TerminusCommand::TerminusPoolSupply { target, .. }
            | TerminusCommand::TerminusController { target }
            | TerminusCommand::BalanceOf { target, .. }
            | TerminusCommand::IsApprovedForAll { target, .. }
            | TerminusCommand::IsApprovedForPool { target, .. }
            | TerminusCommand::Uri { target, .. } => target,
            TerminusCommand::Deploy { tx }
            | TerminusCommand::SetPaymentToken { tx, .. }
            | TerminusCommand::SetPoolBasePrice { tx, .. }
            | TerminusCommand::CreateSimplePool { tx, .. }
            | TerminusCommand::CreatePoolV1 { tx, .. }
            | TerminusCommand::SetPoolController { tx, .. }
            | TerminusCommand::Mint { tx, .. }
            | TerminusCommand::Burn { tx, .. }
            | TerminusCommand::SetApprovalForAll { tx, .. }
            | TerminusCommand::ApproveForPool { tx, .. }
            | TerminusCommand::SafeTransferFrom { tx, .. }
            | TerminusCommand::SetUri { tx, .. } => &tx.network,
        }
    }

    fn transact_args(&self) -> Option<&TransactArgs> {
        match self {
            TerminusCommand::Deploy { tx }
            | TerminusCommand::SetPaymentToken { tx, .. }
            | TerminusCommand::SetPoolBasePrice { tx, .. }
            | TerminusCommand::CreateSimplePool { tx, .. }
            | TerminusCommand::CreatePoolV1 { tx, .. }
            | TerminusCommand::SetPoolController { tx, .. }
            | TerminusCommand::Mint { tx, .. }
            | TerminusCommand::Burn { tx, .. }
            | TerminusCommand::SetApprovalForAll { tx, .. }
            | TerminusCommand::ApproveForPool { tx, .. }
            | TerminusCommand::SafeTransferFrom { tx, .. }
            | TerminusCommand::SetUri { tx, .. } => Some(tx),
            _ => None,
        }
    }
}

pub async fn run(config: &DropperConfig, command: TerminusCommand) -> Result<Value> {
    let terminus = contract_address(config, command.target(), TERMINUS_ARTIFACT)?;

    match command.transact_args().cloned() {
        Some(tx) => {
            let (client, tx_config) = signer_for(config, &tx).await?;
            let mut client = TerminusClient::new(client, terminus).with_transaction_config(tx_config);
            if let TerminusCommand::Deploy { .. } = command {
                let deployed = client.deploy(&artifact(config, TERMINUS_ARTIFACT)?).await?;
                info!(address = ?deployed, network = %tx.network.network, "Deployed MockTerminus");
                return Ok(json!({ "address": address(deployed) }));
            }
            execute(&client, command).await
        }
        None => {
            let provider = provider_for(config, &command.target().network)?;
            execute(&TerminusClient::new(provider.provider(), terminus), command).await
        }
    }
}

/// Run one Terminus call through `terminus`
pub async fn execute<M: Middleware + 'static>(
    terminus: &TerminusClient<M>,
    command: TerminusCommand,
) -> Result<Value> {
    let value = match command {
        TerminusCommand::SetPaymentToken { payment_token, .. } => {
            to_json(&terminus.set_payment_token(payment_token).await?)?
        }
        TerminusCommand::PaymentToken { .. } => address(terminus.payment_token().await?),
        TerminusCommand::SetPoolBasePrice { base_price, .. } => {
            to_json(&terminus.set_pool_base_price(base_price).await?)?
        }
        TerminusCommand::PoolBasePrice { .. } => uint(terminus.pool_base_price().await?),
        TerminusCommand::CreateSimplePool { capacity, .. } => {
            to_json(&terminus.create_simple_pool(capacity).await?)?
        }
        TerminusCommand::CreatePoolV1 { capacity, transferable, burnable, .. } => {
            to_json(&terminus.create_pool_v1(capacity, transferable, burnable).await?)?
        }
        TerminusCommand::TotalPools { .. } => uint(terminus.total_pools().await?),
        TerminusCommand::SetPoolController { pool_id, controller, .. } => {
            to_json(&terminus.set_pool_controller(pool_id, controller).await?)?
        }
        TerminusCommand::TerminusPoolController { pool_id, .. } => {
            address(terminus.terminus_pool_controller(pool_id).await?)
        }
        TerminusCommand::TerminusPoolCapacity { pool_id, .. } => {
            uint(terminus.terminus_pool_capacity(pool_id).await?)
        }
        TerminusCommand::TerminusPoolSupply { pool_id, .. } => {
            uint(terminus.terminus_pool_supply(pool_id).await?)
        }
        TerminusCommand::TerminusController { .. } => address(terminus.terminus_controller().await?),
        TerminusCommand::Mint { to, pool_id, amount, data, .. } => {
            to_json(&terminus.mint(to, pool_id, amount, data).await?)?
        }
        TerminusCommand::Burn { from, pool_id, amount, .. } => {
            to_json(&terminus.burn(from, pool_id, amount).await?)?
        }
        TerminusCommand::BalanceOf { account, pool_id, .. } => {
            uint(terminus.balance_of(account, pool_id).await?)
        }
        TerminusCommand::SetApprovalForAll { operator, approved, .. } => {
            to_json(&terminus.set_approval_for_all(operator, approved).await?)?
        }
        TerminusCommand::IsApprovedForAll { account, operator, .. } => {
            json!(terminus.is_approved_for_all(account, operator).await?)
        }
        TerminusCommand::ApproveForPool { pool_id, operator, .. } => {
            to_json(&terminus.approve_for_pool(pool_id, operator).await?)?
        }
        TerminusCommand::IsApprovedForPool { pool_id, operator, .. } => {
            json!(terminus.is_approved_for_pool(pool_id, operator).await?)
        }
        TerminusCommand::SafeTransferFrom { from, to, pool_id, amount, data, .. } => {
            to_json(&terminus.safe_transfer_from(from, to, pool_id, amount, data).await?)?
        }
        TerminusCommand::Uri { pool_id, .. } => json!(terminus.uri(pool_id).await?),
        TerminusCommand::SetUri { pool_id, pool_uri, .. } => {
            to_json(&terminus.set_uri(pool_id, pool_uri).await?)?
        }
        TerminusCommand::Deploy { .. } => return Err(anyhow!("deploy is not a Terminus call")),
    };
    Ok(value)
}
