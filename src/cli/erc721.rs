//! `dropper mock-erc721 ...`
use anyhow::{anyhow, Result};
use clap::Subcommand;
use dropper_ethereum::tokens::ERC721_ARTIFACT;
use dropper_ethereum::Erc721Client;
use dropper_tools::DropperConfig;
use ethers::providers::Middleware;
use ethers::types::{Address, Bytes, U256};
use serde_json::{json, Value};
use tracing::info;

use super::args::{parse_address, parse_bool, parse_bytes, parse_bytes4, parse_u256, NetworkArgs, TransactArgs};
use super::{address, artifact, contract_address, provider_for, signer_for, to_json, uint};

#[derive(Subcommand, Debug)]
pub enum Erc721Command {
    /// Deploy a new MockERC721
    Deploy {
        #[command(flatten)]
        tx: TransactArgs,
    },

    Approve {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,
    },

    BalanceOf {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_address)]
        owner: Address,
    },

    GetApproved {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,
    },

    IsApprovedForAll {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_address)]
        owner: Address,

        #[arg(long, value_parser = parse_address)]
        operator: Address,
    },

    /// Mint a token to an address
    Mint {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,
    },

    Name {
        #[command(flatten)]
        target: NetworkArgs,
    },

    OwnerOf {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,
    },

    /// safeTransferFrom, with the data overload when --data is given
    SafeTransferFrom {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        from: Address,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,

        #[arg(long, value_parser = parse_bytes)]
        data: Option<Bytes>,
    },

    SetApprovalForAll {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        operator: Address,

        #[arg(long, value_parser = parse_bool, action = clap::ArgAction::Set)]
        approved: bool,
    },

    SupportsInterface {
        #[command(flatten)]
        target: NetworkArgs,

        /// Four-byte ERC-165 interface id, e.g. 0x80ac58cd
        #[arg(long, value_parser = parse_bytes4)]
        interface_id: [u8; 4],
    },

    Symbol {
        #[command(flatten)]
        target: NetworkArgs,
    },

    TokenByIndex {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        index: U256,
    },

    TokenOfOwnerByIndex {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_address)]
        owner: Address,

        #[arg(long, value_parser = parse_u256)]
        index: U256,
    },

    TokenUri {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,
    },

    TotalSupply {
        #[command(flatten)]
        target: NetworkArgs,
    },

    TransferFrom {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        from: Address,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,
    },
}

impl Erc721Command {
    fn target(&self) -> &NetworkArgs {
        match self {
            Erc721Command::BalanceOf { target, .. }
            | Erc721Command::GetApproved { target, .. }
            | Erc721Command::IsApprovedForAll { target, .. }
            | Erc721Command::Name { target }
            | Erc721Command::OwnerOf { target, .. }
            | Erc721Command::SupportsInterface { target, .. }
            | Erc721Command::Symbol { target }
            | Erc721Command::TokenByIndex { target, .. }
            | Erc721Command::TokenOfOwnerByIndex { target, .. }
            | Erc721Command::TokenUri { target, .. }
            | Erc721Command::TotalSupply { target } => target,
            Erc721Command::Deploy { tx }
            | Erc721Command::Approve { tx, .. }
            | Erc721Command::Mint { tx, .. }
            | Erc721Command::SafeTransferFrom { tx, .. }
            | Erc721Command::SetApprovalForAll { tx, .. }
            | Erc721Command::TransferFrom { tx, .. } => &tx.network,
        }
    }

    fn transact_args(&self) -> Option<&TransactArgs> {
        match self {
            Erc721Command::Deploy { tx }
            | Erc721Command::Approve { tx, .. }
            | Erc721Command::Mint { tx, .. }
            | Erc721Command::SafeTransferFrom { tx, .. }
            | Erc721Command::SetApprovalForAll { tx, .. }
            | Erc721Command::TransferFrom { tx, .. } => Some(tx),
            _ => None,
        }
    }
}

pub async fn run(config: &DropperConfig, command: Erc721Command) -> Result<Value> {
    let token = contract_address(config, command.target(), ERC721_ARTIFACT)?;

    match command.transact_args().cloned() {
        Some(tx) => {
            let (client, tx_config) = signer_for(config, &tx).await?;
            let mut erc721 = Erc721Client::new(client, token).with_transaction_config(tx_config);
            if let Erc721Command::Deploy { .. } = command {
                let deployed = erc721.deploy(&artifact(config, ERC721_ARTIFACT)?).await?;
                info!(address = ?deployed, network = %tx.network.network, "Deployed MockERC721");
                return Ok(json!({ "address": address(deployed) }));
            }
            execute(&erc721, command).await
        }
        None => {
            let provider = provider_for(config, &command.target().network)?;
            execute(&Erc721Client::new(provider.provider(), token), command).await
        }
    }
}

/// Run one token call through `erc721`
pub async fn execute<M: Middleware + 'static>(erc721: &Erc721Client<M>, command: Erc721Command) -> Result<Value> {
    let value = match command {
        Erc721Command::Approve { to, token_id, .. } => to_json(&erc721.approve(to, token_id).await?)?,
        Erc721Command::BalanceOf { owner, .. } => uint(erc721.balance_of(owner).await?),
        Erc721Command::GetApproved { token_id, .. } => address(erc721.get_approved(token_id).await?),
        Erc721Command::IsApprovedForAll { owner, operator, .. } => {
            json!(erc721.is_approved_for_all(owner, operator).await?)
        }
        Erc721Command::Mint { to, token_id, .. } => to_json(&erc721.mint(to, token_id).await?)?,
        Erc721Command::Name { .. } => json!(erc721.name().await?),
        Erc721Command::OwnerOf { token_id, .. } => address(erc721.owner_of(token_id).await?),
        Erc721Command::SafeTransferFrom { from, to, token_id, data, .. } => {
            let receipt = match data {
                Some(data) => erc721.safe_transfer_from_with_data(from, to, token_id, data).await?,
                None => erc721.safe_transfer_from(from, to, token_id).await?,
            };
            to_json(&receipt)?
        }
        Erc721Command::SetApprovalForAll { operator, approved, .. } => {
            to_json(&erc721.set_approval_for_all(operator, approved).await?)?
        }
        Erc721Command::SupportsInterface { interface_id, .. } => {
            json!(erc721.supports_interface(interface_id).await?)
        }
        Erc721Command::Symbol { .. } => json!(erc721.symbol().await?),
        Erc721Command::TokenByIndex { index, .. } => uint(erc721.token_by_index(index).await?),
        Erc721Command::TokenOfOwnerByIndex { owner, index, .. } => {
            uint(erc721.token_of_owner_by_index(owner, index).await?)
        }
        Erc721Command::TokenUri { token_id, .. } => json!(erc721.token_uri(token_id).await?),
        Erc721Command::TotalSupply { .. } => uint(erc721.total_supply().await?),
        Erc721Command::TransferFrom { from, to, token_id, .. } => {
            to_json(&erc721.transfer_from(from, to, token_id).await?)?
        }
        Erc721Command::Deploy { .. } => return Err(anyhow!("deploy is not a token call")),
    };
    Ok(value)
}
