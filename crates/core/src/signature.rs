//! EIP-712 claim payloads
//!
//! A claim signer authorizes one claimant by signing the typed-data digest of
//! `ClaimPayload(uint256 claimId,address claimant,uint256 blockDeadline)`
//! under the dropper's domain.

use dropper_common::{Error, Result};
use ethers::abi::{self, Token};
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, Signature, H256, U256};
use ethers::utils::keccak256;

/// Domain name the Dropper contract signs under
pub const DOMAIN_NAME: &str = "Moonstream Dropper";

/// Domain version the Dropper contract signs under
pub const DOMAIN_VERSION: &str = "0.1.0";

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const CLAIM_PAYLOAD_TYPE: &str = "ClaimPayload(uint256 claimId,address claimant,uint256 blockDeadline)";

/// Signing domain of one deployed dropper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimDomain {
    /// Chain the dropper is deployed on
    pub chain_id: u64,

    /// Dropper contract address
    pub verifying_contract: Address,
}

impl ClaimDomain {
    /// Create a new domain
    pub fn new(chain_id: u64, verifying_contract: Address) -> Self {
        Self { chain_id, verifying_contract }
    }

    /// EIP-712 domain separator
    pub fn separator(&self) -> H256 {
        let encoded = abi::encode(&[
            Token::FixedBytes(keccak256(DOMAIN_TYPE).to_vec()),
            Token::FixedBytes(keccak256(DOMAIN_NAME).to_vec()),
            Token::FixedBytes(keccak256(DOMAIN_VERSION).to_vec()),
            Token::Uint(U256::from(self.chain_id)),
            Token::Address(self.verifying_contract),
        ]);
        H256(keccak256(encoded))
    }

    /// Digest the signer signs to let `claimant` redeem `claim_id` until `block_deadline`
    pub fn claim_message_hash(&self, claim_id: U256, claimant: Address, block_deadline: U256) -> H256 {
        let struct_hash = keccak256(abi::encode(&[
            Token::FixedBytes(keccak256(CLAIM_PAYLOAD_TYPE).to_vec()),
            Token::Uint(claim_id),
            Token::Address(claimant),
            Token::Uint(block_deadline),
        ]));

        let mut preimage = Vec::with_capacity(66);
        preimage.extend_from_slice(&[0x19, 0x01]);
        preimage.extend_from_slice(self.separator().as_bytes());
        preimage.extend_from_slice(&struct_hash);
        H256(keccak256(preimage))
    }
}

/// Sign a claim message digest as-is (no personal-message prefix)
pub fn sign_claim_message(wallet: &LocalWallet, message_hash: H256) -> Result<Bytes> {
    let signature = wallet
        .sign_hash(message_hash)
        .map_err(|e| Error::generic(format!("Failed to sign claim message: {}", e)))?;
    Ok(Bytes::from(signature.to_vec()))
}

/// Address that produced `signature` over `message_hash`
pub fn recover_claim_signer(message_hash: H256, signature: &[u8]) -> Result<Address> {
    let signature = Signature::try_from(signature)
        .map_err(|e| Error::validation(format!("Malformed claim signature: {}", e)))?;
    signature
        .recover(message_hash)
        .map_err(|e| Error::validation(format!("Unrecoverable claim signature: {}", e)))
}
