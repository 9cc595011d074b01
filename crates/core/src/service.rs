use async_trait::async_trait;
use dropper_common::{Error, Result};
use ethers::types::{Address, Bytes, H256, U256};

use crate::types::{ClaimId, ClaimTerms, ClaimType, CreatedClaim, TxReceipt};

/// Interfaces a Dropper backend exposes to claim clients. Mutating calls
/// execute as the backend's bound sender.

/// Claim registry operations
#[async_trait]
pub trait ClaimRegistry: Send + Sync {
    /// Register a new claim. Administrator only.
    async fn create_claim(
        &self,
        claim_type: ClaimType,
        token_address: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<CreatedClaim>;

    /// Reward parameters of an existing claim
    async fn get_claim(&self, claim_id: ClaimId) -> Result<ClaimTerms>;

    /// Whether an existing claim is active
    async fn claim_status(&self, claim_id: ClaimId) -> Result<bool>;

    /// Activate or deactivate a claim. Administrator only.
    async fn set_claim_status(&self, claim_id: ClaimId, active: bool) -> Result<TxReceipt>;

    /// Designate the address whose signatures authorize redemptions. Administrator only.
    async fn set_signer_for_claim(&self, claim_id: ClaimId, signer: Address) -> Result<TxReceipt>;

    /// Current signer of a claim (zero address when unset)
    async fn get_signer_for_claim(&self, claim_id: ClaimId) -> Result<Address>;

    /// Number of claims ever created
    async fn num_claims(&self) -> Result<U256>;

    /// Digest the claim signer has to sign for `claimant`
    async fn claim_message_hash(
        &self,
        claim_id: ClaimId,
        claimant: Address,
        block_deadline: U256,
    ) -> Result<H256>;

    /// Redeem a claim as the bound sender
    async fn claim(&self, claim_id: ClaimId, block_deadline: U256, signature: Bytes) -> Result<TxReceipt>;

    /// Whether `claimant` has already redeemed the claim
    async fn redemption_status(&self, claim_id: ClaimId, claimant: Address) -> Result<bool>;
}

/// Escrow withdrawal operations. Administrator only.
#[async_trait]
pub trait AssetEscrow: Send + Sync {
    /// Withdraw `amount` of an ERC-20 token to the administrator
    async fn withdraw_erc20(&self, token_address: Address, amount: U256) -> Result<TxReceipt>;

    /// Withdraw an ERC-721 token to the administrator
    async fn withdraw_erc721(&self, token_address: Address, token_id: U256) -> Result<TxReceipt>;

    /// Withdraw `amount` of an ERC-1155 token to the administrator
    async fn withdraw_erc1155(
        &self,
        token_address: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<TxReceipt>;
}

/// Ownership of the service
#[async_trait]
pub trait Administered: Send + Sync {
    /// Current administrator
    async fn owner(&self) -> Result<Address>;

    /// Hand administration to `new_owner`. Administrator only.
    async fn transfer_ownership(&self, new_owner: Address) -> Result<TxReceipt>;
}

/// Reject ids outside `1..=num_claims`
pub fn check_claim_id(claim_id: ClaimId, num_claims: U256) -> Result<()> {
    if claim_id.is_zero() || claim_id > num_claims {
        return Err(Error::not_found(format!("Claim {} does not exist", claim_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_claim_id_bounds() {
        assert!(matches!(check_claim_id(U256::zero(), U256::from(3)), Err(Error::NotFound(_))));
        assert!(check_claim_id(U256::one(), U256::from(3)).is_ok());
        assert!(check_claim_id(U256::from(3), U256::from(3)).is_ok());
        assert!(matches!(check_claim_id(U256::from(4), U256::from(3)), Err(Error::NotFound(_))));
    }
}
