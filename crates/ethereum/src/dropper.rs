//! Dropper contract client

use std::sync::Arc;

use async_trait::async_trait;
use dropper_common::{Error, Result};
use dropper_core::{
    check_claim_id, Administered, AssetEscrow, ClaimId, ClaimRegistry, ClaimTerms, ClaimType,
    CreatedClaim, DropperEvent, LoggedEvent, TxReceipt,
};
use ethers::contract::{parse_log, ContractCall};
use ethers::providers::Middleware;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};
use tracing::{debug, info, warn};

use crate::artifacts::ContractArtifact;
use crate::bindings::{Dropper, DropperEvents};
use crate::errors::contract_error;
use crate::transaction::{deploy_contract, send_call, TransactionConfig};

/// Name of the Dropper build artifact
pub const DROPPER_ARTIFACT: &str = "Dropper";

/// Client for a deployed Dropper contract
#[derive(Debug, Clone)]
pub struct DropperClient<M> {
    client: Arc<M>,
    contract: Option<Dropper<M>>,
    tx_config: TransactionConfig,
}

impl<M: Middleware + 'static> DropperClient<M> {
    /// Bind to the Dropper at `address`. Without an address every operation
    /// fails with `NotInstantiated` until the client is deployed.
    pub fn new(client: Arc<M>, address: Option<Address>) -> Self {
        let contract = address.map(|address| Dropper::new(address, Arc::clone(&client)));
        Self {
            client,
            contract,
            tx_config: TransactionConfig::default(),
        }
    }

    /// Use `tx_config` for every transaction this client submits
    pub fn with_transaction_config(mut self, tx_config: TransactionConfig) -> Self {
        self.tx_config = tx_config;
        self
    }

    /// Deployed address, if known
    pub fn address(&self) -> Option<Address> {
        self.contract.as_ref().map(|contract| contract.address())
    }

    /// Deploy a new Dropper from its build artifact and bind to it.
    /// The deployer becomes the administrator.
    pub async fn deploy(&mut self, artifact: &ContractArtifact) -> Result<Address> {
        let address = deploy_contract(Arc::clone(&self.client), artifact, &self.tx_config).await?;
        self.contract = Some(Dropper::new(address, Arc::clone(&self.client)));
        Ok(address)
    }

    /// Dropper events emitted in `from_block..=to_block`
    pub async fn fetch_events(&self, from_block: u64, to_block: u64) -> Result<Vec<LoggedEvent>> {
        let contract = self.contract()?;
        let events = contract
            .events()
            .from_block(from_block)
            .to_block(to_block)
            .query_with_meta()
            .await
            .map_err(|e| contract_error("fetch events", e))?;

        debug!(from_block, to_block, count = events.len(), "Fetched Dropper events");
        Ok(events
            .into_iter()
            .map(|(event, meta)| LoggedEvent {
                block_number: meta.block_number.as_u64(),
                tx_hash: meta.transaction_hash,
                address: meta.address,
                event: dropper_event(event),
            })
            .collect())
    }

    fn contract(&self) -> Result<&Dropper<M>> {
        self.contract
            .as_ref()
            .ok_or_else(|| Error::not_instantiated("Dropper contract address is not set; deploy it or pass --address"))
    }

    async fn transact<D: ethers::abi::Detokenize>(
        &self,
        call: ContractCall<M, D>,
        operation: &str,
    ) -> Result<TxReceipt> {
        let address = self.contract()?.address();
        let receipt = send_call(call, &self.tx_config, operation).await?;
        Ok(summarize(address, receipt))
    }
}

/// Convert a mined receipt into a `TxReceipt`, decoding the events `dropper` emitted
pub fn summarize(dropper: Address, receipt: TransactionReceipt) -> TxReceipt {
    let events = receipt
        .logs
        .iter()
        .filter(|log| log.address == dropper)
        .filter_map(|log| match parse_log::<DropperEvents>(log.clone()) {
            Ok(event) => Some(dropper_event(event)),
            Err(e) => {
                warn!(tx_hash = ?receipt.transaction_hash, "Skipping undecodable Dropper log: {}", e);
                None
            }
        })
        .collect();

    TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|number| number.as_u64()).unwrap_or_default(),
        from: receipt.from,
        gas_used: receipt.gas_used,
        events,
    }
}

fn dropper_event(event: DropperEvents) -> DropperEvent {
    match event {
        DropperEvents::ClaimCreatedFilter(e) => DropperEvent::ClaimCreated {
            claim_id: e.claim_id,
            claim_type: e.token_type,
            token_address: e.token_address,
            token_id: e.token_id,
            amount: e.amount,
        },
        DropperEvents::ClaimStatusChangedFilter(e) => DropperEvent::ClaimStatusChanged {
            claim_id: e.claim_id,
            status: e.status,
        },
        DropperEvents::ClaimSignerChangedFilter(e) => DropperEvent::ClaimSignerChanged {
            claim_id: e.claim_id,
            signer: e.signer,
        },
        DropperEvents::ClaimedFilter(e) => DropperEvent::Claimed {
            claim_id: e.claim_id,
            claimant: e.claimant,
        },
    }
}

#[async_trait]
impl<M: Middleware + 'static> ClaimRegistry for DropperClient<M> {
    async fn create_claim(
        &self,
        claim_type: ClaimType,
        token_address: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<CreatedClaim> {
        let call = self.contract()?.create_claim(claim_type.into(), token_address, token_id, amount);
        let receipt = self.transact(call, "createClaim").await?;
        let created = CreatedClaim::from_receipt(receipt)?;
        info!(claim_id = %created.claim_id, %claim_type, ?token_address, "Created claim");
        Ok(created)
    }

    async fn get_claim(&self, claim_id: ClaimId) -> Result<ClaimTerms> {
        check_claim_id(claim_id, self.num_claims().await?)?;
        let raw = self
            .contract()?
            .get_claim(claim_id)
            .call()
            .await
            .map_err(|e| contract_error("getClaim", e))?;
        ClaimTerms::from_tuple(raw)
    }

    async fn claim_status(&self, claim_id: ClaimId) -> Result<bool> {
        check_claim_id(claim_id, self.num_claims().await?)?;
        self.contract()?
            .claim_status(claim_id)
            .call()
            .await
            .map_err(|e| contract_error("claimStatus", e))
    }

    async fn set_claim_status(&self, claim_id: ClaimId, active: bool) -> Result<TxReceipt> {
        let call = self.contract()?.set_claim_status(claim_id, active);
        self.transact(call, "setClaimStatus").await
    }

    async fn set_signer_for_claim(&self, claim_id: ClaimId, signer: Address) -> Result<TxReceipt> {
        let call = self.contract()?.set_signer_for_claim(claim_id, signer);
        self.transact(call, "setSignerForClaim").await
    }

    async fn get_signer_for_claim(&self, claim_id: ClaimId) -> Result<Address> {
        self.contract()?
            .get_signer_for_claim(claim_id)
            .call()
            .await
            .map_err(|e| contract_error("getSignerForClaim", e))
    }

    async fn num_claims(&self) -> Result<U256> {
        self.contract()?
            .num_claims()
            .call()
            .await
            .map_err(|e| contract_error("numClaims", e))
    }

    async fn claim_message_hash(
        &self,
        claim_id: ClaimId,
        claimant: Address,
        block_deadline: U256,
    ) -> Result<H256> {
        let hash = self
            .contract()?
            .claim_message_hash(claim_id, claimant, block_deadline)
            .call()
            .await
            .map_err(|e| contract_error("claimMessageHash", e))?;
        Ok(H256::from(hash))
    }

    async fn claim(&self, claim_id: ClaimId, block_deadline: U256, signature: Bytes) -> Result<TxReceipt> {
        let call = self.contract()?.claim(claim_id, block_deadline, signature);
        self.transact(call, "claim").await
    }

    async fn redemption_status(&self, claim_id: ClaimId, claimant: Address) -> Result<bool> {
        self.contract()?
            .get_claim_status(claim_id, claimant)
            .call()
            .await
            .map_err(|e| contract_error("getClaimStatus", e))
    }
}

#[async_trait]
impl<M: Middleware + 'static> AssetEscrow for DropperClient<M> {
    async fn withdraw_erc20(&self, token_address: Address, amount: U256) -> Result<TxReceipt> {
        let call = self.contract()?.withdraw_erc20(token_address, amount);
        self.transact(call, "withdrawERC20").await
    }

    async fn withdraw_erc721(&self, token_address: Address, token_id: U256) -> Result<TxReceipt> {
        let call = self.contract()?.withdraw_erc721(token_address, token_id);
        self.transact(call, "withdrawERC721").await
    }

    async fn withdraw_erc1155(
        &self,
        token_address: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<TxReceipt> {
        let call = self.contract()?.withdraw_erc1155(token_address, token_id, amount);
        self.transact(call, "withdrawERC1155").await
    }
}

#[async_trait]
impl<M: Middleware + 'static> Administered for DropperClient<M> {
    async fn owner(&self) -> Result<Address> {
        self.contract()?
            .owner()
            .call()
            .await
            .map_err(|e| contract_error("owner", e))
    }

    async fn transfer_ownership(&self, new_owner: Address) -> Result<TxReceipt> {
        if new_owner.is_zero() {
            return Err(Error::validation("new owner is the zero address"));
        }
        let call = self.contract()?.transfer_ownership(new_owner);
        self.transact(call, "transferOwnership").await
    }
}
