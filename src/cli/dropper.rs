//! `dropper dropper ...`: the claim registry, escrow and ownership operations
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Subcommand;
use dropper_core::{
    sign_claim_message, Administered, AssetEscrow, ClaimId, ClaimRegistry, ClaimTerms, ClaimType,
};
use dropper_ethereum::dropper::DROPPER_ARTIFACT;
use dropper_ethereum::{load_keystore, DropperClient};
use dropper_tools::DropperConfig;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, U256};
use serde_json::{json, Value};
use tracing::info;

use super::args::{parse_address, parse_bool, parse_bytes, parse_u256, NetworkArgs, TransactArgs};
use super::{address, artifact, contract_address, provider_for, signer_for, to_json, uint};

#[derive(Subcommand, Debug)]
pub enum DropperCommand {
    /// Deploy a new Dropper; the sender becomes its administrator
    Deploy {
        #[command(flatten)]
        tx: TransactArgs,
    },

    /// Register a new claim
    CreateClaim {
        #[command(flatten)]
        tx: TransactArgs,

        /// Reward type: erc20, erc721, erc1155, terminus-mintable, or its numeric code
        #[arg(long)]
        claim_type: ClaimType,

        #[arg(long, value_parser = parse_address)]
        token_address: Address,

        #[arg(long, value_parser = parse_u256, default_value = "0")]
        token_id: U256,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },

    /// Reward parameters of a claim
    GetClaim {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,
    },

    /// Whether a claim is active
    ClaimStatus {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,
    },

    /// Activate or deactivate a claim
    SetClaimStatus {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,

        #[arg(long, value_parser = parse_bool, action = clap::ArgAction::Set)]
        status: bool,
    },

    /// Set the address whose signatures authorize redemptions of a claim
    SetSignerForClaim {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,

        #[arg(long, value_parser = parse_address)]
        signer: Address,
    },

    /// Current signer of a claim
    GetSignerForClaim {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,
    },

    /// Number of claims ever created
    NumClaims {
        #[command(flatten)]
        target: NetworkArgs,
    },

    /// Digest a claim signer signs for a claimant
    ClaimMessageHash {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,

        #[arg(long, value_parser = parse_address)]
        claimant: Address,

        #[arg(long, value_parser = parse_u256)]
        block_deadline: U256,
    },

    /// Sign a claim message with the claim signer's keystore
    SignClaim {
        #[command(flatten)]
        target: NetworkArgs,

        /// Path to the claim signer's keystore file
        #[arg(long)]
        signer: PathBuf,

        /// Password to keystore file (if you do not provide it, you will be prompted for it)
        #[arg(long)]
        password: Option<String>,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,

        #[arg(long, value_parser = parse_address)]
        claimant: Address,

        #[arg(long, value_parser = parse_u256)]
        block_deadline: U256,
    },

    /// Redeem a claim as the sender
    Claim {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,

        #[arg(long, value_parser = parse_u256)]
        block_deadline: U256,

        /// Claim signer's signature (0x-prefixed hex)
        #[arg(long, value_parser = parse_bytes)]
        signature: Bytes,
    },

    /// Whether a claimant has already redeemed a claim
    RedemptionStatus {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_u256)]
        claim_id: ClaimId,

        #[arg(long, value_parser = parse_address)]
        claimant: Address,
    },

    /// Withdraw escrowed ERC-20 tokens to the administrator
    WithdrawErc20 {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        token_address: Address,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },

    /// Withdraw an escrowed ERC-721 token to the administrator
    WithdrawErc721 {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        token_address: Address,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,
    },

    /// Withdraw escrowed ERC-1155 tokens to the administrator
    WithdrawErc1155 {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        token_address: Address,

        #[arg(long, value_parser = parse_u256)]
        token_id: U256,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },

    /// Current administrator
    Owner {
        #[command(flatten)]
        target: NetworkArgs,
    },

    /// Hand administration to another address
    TransferOwnership {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        new_owner: Address,
    },

    /// Dropper events emitted in a block range
    Events {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long)]
        from_block: u64,

        /// Last block to scan (defaults to the latest block)
        #[arg(long)]
        to_block: Option<u64>,
    },
}

impl DropperCommand {
    fn target(&self) -> &NetworkArgs {
        match self {
            DropperCommand::GetClaim { target, .. }
            | DropperCommand::ClaimStatus { target, .. }
            | DropperCommand::GetSignerForClaim { target, .. }
            | DropperCommand::NumClaims { target }
            | DropperCommand::ClaimMessageHash { target, .. }
            | DropperCommand::SignClaim { target, .. }
            | DropperCommand::RedemptionStatus { target, .. }
            | DropperCommand::Owner { target }
            | DropperCommand::Events { target, .. } => target,
            DropperCommand::Deploy { tx }
            | DropperCommand::CreateClaim { tx, .. }
            | DropperCommand::SetClaimStatus { tx, .. }
            | DropperCommand::SetSignerForClaim { tx, .. }
            | DropperCommand::Claim { tx, .. }
            | DropperCommand::WithdrawErc20 { tx, .. }
            | DropperCommand::WithdrawErc721 { tx, .. }
            | DropperCommand::WithdrawErc1155 { tx, .. }
            | DropperCommand::TransferOwnership { tx, .. } => &tx.network,
        }
    }

    fn transact_args(&self) -> Option<&TransactArgs> {
        match self {
            DropperCommand::Deploy { tx }
            | DropperCommand::CreateClaim { tx, .. }
            | DropperCommand::SetClaimStatus { tx, .. }
            | DropperCommand::SetSignerForClaim { tx, .. }
            | DropperCommand::Claim { tx, .. }
            | DropperCommand::WithdrawErc20 { tx, .. }
            | DropperCommand::WithdrawErc721 { tx, .. }
            | DropperCommand::WithdrawErc1155 { tx, .. }
            | DropperCommand::TransferOwnership { tx, .. } => Some(tx),
            _ => None,
        }
    }
}

pub async fn run(config: &DropperConfig, command: DropperCommand) -> Result<Value> {
    let dropper = contract_address(config, command.target(), DROPPER_ARTIFACT)?;

    match command {
        DropperCommand::Deploy { tx } => {
            let artifact = artifact(config, DROPPER_ARTIFACT)?;
            let (client, tx_config) = signer_for(config, &tx).await?;
            let mut dropper = DropperClient::new(client, None).with_transaction_config(tx_config);
            let deployed = dropper.deploy(&artifact).await?;
            info!(address = ?deployed, network = %tx.network.network, "Deployed Dropper");
            Ok(json!({ "address": address(deployed) }))
        }
        DropperCommand::Events { target, from_block, to_block } => {
            let provider = provider_for(config, &target.network)?;
            let to_block = match to_block {
                Some(block) => block,
                None => provider.latest_block_number().await?,
            };
            let events = DropperClient::new(provider.provider(), dropper)
                .fetch_events(from_block, to_block)
                .await?;
            to_json(&events)
        }
        DropperCommand::SignClaim { target, signer, password, claim_id, claimant, block_deadline } => {
            let wallet = load_keystore(&signer, password.as_deref())?;
            let registry = DropperClient::new(provider_for(config, &target.network)?.provider(), dropper);
            sign_claim(&registry, &wallet, claim_id, claimant, block_deadline).await
        }
        command => match command.transact_args().cloned() {
            Some(tx) => {
                let (client, tx_config) = signer_for(config, &tx).await?;
                let backend = DropperClient::new(client, dropper).with_transaction_config(tx_config);
                execute(&backend, command).await
            }
            None => {
                let provider = provider_for(config, &command.target().network)?;
                execute(&DropperClient::new(provider.provider(), dropper), command).await
            }
        },
    }
}

/// Run a contract operation against any dropper backend
pub async fn execute<B>(backend: &B, command: DropperCommand) -> Result<Value>
where
    B: ClaimRegistry + AssetEscrow + Administered,
{
    let value = match command {
        DropperCommand::CreateClaim { claim_type, token_address, token_id, amount, .. } => {
            let created = backend.create_claim(claim_type, token_address, token_id, amount).await?;
            json!({
                "claim_id": uint(created.claim_id),
                "receipt": to_json(&created.receipt)?,
            })
        }
        DropperCommand::GetClaim { claim_id, .. } => terms_json(&backend.get_claim(claim_id).await?),
        DropperCommand::ClaimStatus { claim_id, .. } => json!(backend.claim_status(claim_id).await?),
        DropperCommand::SetClaimStatus { claim_id, status, .. } => {
            to_json(&backend.set_claim_status(claim_id, status).await?)?
        }
        DropperCommand::SetSignerForClaim { claim_id, signer, .. } => {
            to_json(&backend.set_signer_for_claim(claim_id, signer).await?)?
        }
        DropperCommand::GetSignerForClaim { claim_id, .. } => {
            address(backend.get_signer_for_claim(claim_id).await?)
        }
        DropperCommand::NumClaims { .. } => uint(backend.num_claims().await?),
        DropperCommand::ClaimMessageHash { claim_id, claimant, block_deadline, .. } => {
            let hash = backend.claim_message_hash(claim_id, claimant, block_deadline).await?;
            json!(format!("{:?}", hash))
        }
        DropperCommand::Claim { claim_id, block_deadline, signature, .. } => {
            to_json(&backend.claim(claim_id, block_deadline, signature).await?)?
        }
        DropperCommand::RedemptionStatus { claim_id, claimant, .. } => {
            json!(backend.redemption_status(claim_id, claimant).await?)
        }
        DropperCommand::WithdrawErc20 { token_address, amount, .. } => {
            to_json(&backend.withdraw_erc20(token_address, amount).await?)?
        }
        DropperCommand::WithdrawErc721 { token_address, token_id, .. } => {
            to_json(&backend.withdraw_erc721(token_address, token_id).await?)?
        }
        DropperCommand::WithdrawErc1155 { token_address, token_id, amount, .. } => {
            to_json(&backend.withdraw_erc1155(token_address, token_id, amount).await?)?
        }
        DropperCommand::Owner { .. } => address(backend.owner().await?),
        DropperCommand::TransferOwnership { new_owner, .. } => {
            to_json(&backend.transfer_ownership(new_owner).await?)?
        }
        DropperCommand::Deploy { .. } | DropperCommand::Events { .. } | DropperCommand::SignClaim { .. } => {
            return Err(anyhow!("command is not a single contract call"));
        }
    };
    Ok(value)
}

/// Ask the registry for the claim digest and sign it as the claim signer
pub async fn sign_claim<R: ClaimRegistry>(
    registry: &R,
    wallet: &LocalWallet,
    claim_id: ClaimId,
    claimant: Address,
    block_deadline: U256,
) -> Result<Value> {
    let message_hash = registry.claim_message_hash(claim_id, claimant, block_deadline).await?;
    let signature = sign_claim_message(wallet, message_hash)?;
    info!(%claim_id, ?claimant, %block_deadline, signer = ?wallet.address(), "Signed claim");

    Ok(json!({
        "claim_id": uint(claim_id),
        "claimant": address(claimant),
        "block_deadline": uint(block_deadline),
        "message_hash": format!("{:?}", message_hash),
        "signer": address(wallet.address()),
        "signature": format!("0x{}", hex::encode(&signature)),
    }))
}

fn terms_json(terms: &ClaimTerms) -> Value {
    json!({
        "claim_type": terms.claim_type.to_string(),
        "claim_type_code": terms.claim_type.code(),
        "token_address": address(terms.token_address),
        "token_id": uint(terms.token_id),
        "amount": uint(terms.amount),
    })
}
