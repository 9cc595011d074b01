use std::fmt;
use std::str::FromStr;

use dropper_common::{Error, Result};
use ethers::types::{Address, H256, U256};
use serde::{Deserialize, Serialize};

/// Claim identifier. Sequential, starting at 1, never reused.
pub type ClaimId = U256;

/// Reward category of a claim, encoded on chain as its numeric code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// Mint `amount` from a Terminus pool the dropper controls
    TerminusMintable,

    /// Transfer `amount` of an ERC-20 token
    Erc20,

    /// Transfer the ERC-721 token `token_id`
    Erc721,

    /// Transfer `amount` of the ERC-1155 token `token_id`
    Erc1155,
}

impl ClaimType {
    /// All claim types, in code order
    pub const ALL: [ClaimType; 4] = [
        ClaimType::TerminusMintable,
        ClaimType::Erc20,
        ClaimType::Erc721,
        ClaimType::Erc1155,
    ];

    /// Numeric code stored by the contract
    pub const fn code(&self) -> u64 {
        match self {
            ClaimType::TerminusMintable => 1,
            ClaimType::Erc20 => 20,
            ClaimType::Erc721 => 721,
            ClaimType::Erc1155 => 1155,
        }
    }

    /// Decode a contract-side code
    pub fn from_code(code: U256) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|claim_type| U256::from(claim_type.code()) == code)
            .ok_or_else(|| Error::validation(format!("Unknown claim type: {}", code)))
    }
}

impl From<ClaimType> for U256 {
    fn from(claim_type: ClaimType) -> Self {
        U256::from(claim_type.code())
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimType::TerminusMintable => write!(f, "terminus-mintable"),
            ClaimType::Erc20 => write!(f, "erc20"),
            ClaimType::Erc721 => write!(f, "erc721"),
            ClaimType::Erc1155 => write!(f, "erc1155"),
        }
    }
}

impl FromStr for ClaimType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "terminus-mintable" | "terminus" => Ok(ClaimType::TerminusMintable),
            "erc20" => Ok(ClaimType::Erc20),
            "erc721" => Ok(ClaimType::Erc721),
            "erc1155" => Ok(ClaimType::Erc1155),
            other => {
                let code = U256::from_dec_str(other)
                    .map_err(|_| Error::validation(format!("Unknown claim type: {}", other)))?;
                Self::from_code(code)
            }
        }
    }
}

/// Immutable reward parameters of a claim, as returned by `getClaim`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTerms {
    /// Reward category
    pub claim_type: ClaimType,

    /// Token contract paying the reward
    pub token_address: Address,

    /// Token id (ERC-721 token, ERC-1155 id or Terminus pool)
    pub token_id: U256,

    /// Reward quantity
    pub amount: U256,
}

impl ClaimTerms {
    /// The raw `(tokenType, tokenAddress, tokenId, amount)` tuple
    pub fn as_tuple(&self) -> (U256, Address, U256, U256) {
        (self.claim_type.into(), self.token_address, self.token_id, self.amount)
    }

    /// Build terms from the raw contract tuple
    pub fn from_tuple(raw: (U256, Address, U256, U256)) -> Result<Self> {
        let (claim_type, token_address, token_id, amount) = raw;
        Ok(Self {
            claim_type: ClaimType::from_code(claim_type)?,
            token_address,
            token_id,
            amount,
        })
    }
}

/// A claim record: its terms plus the administrator-mutable fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim identifier
    pub id: ClaimId,

    /// Reward parameters
    pub terms: ClaimTerms,

    /// Whether the claim can currently be redeemed
    pub active: bool,

    /// Address whose signature authorizes redemptions; zero when unset
    pub signer: Address,
}

/// Events emitted by the Dropper contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "PascalCase")]
pub enum DropperEvent {
    /// A claim was registered
    ClaimCreated {
        claim_id: ClaimId,
        claim_type: U256,
        token_address: Address,
        token_id: U256,
        amount: U256,
    },

    /// A claim's active flag was set
    ClaimStatusChanged { claim_id: ClaimId, status: bool },

    /// A claim's signer was set
    ClaimSignerChanged { claim_id: ClaimId, signer: Address },

    /// A claimant redeemed a claim
    Claimed { claim_id: ClaimId, claimant: Address },
}

impl DropperEvent {
    /// Name of the event as declared in the contract ABI
    pub fn name(&self) -> &'static str {
        match self {
            DropperEvent::ClaimCreated { .. } => "ClaimCreated",
            DropperEvent::ClaimStatusChanged { .. } => "ClaimStatusChanged",
            DropperEvent::ClaimSignerChanged { .. } => "ClaimSignerChanged",
            DropperEvent::Claimed { .. } => "Claimed",
        }
    }

    /// Claim the event refers to
    pub fn claim_id(&self) -> ClaimId {
        match self {
            DropperEvent::ClaimCreated { claim_id, .. }
            | DropperEvent::ClaimStatusChanged { claim_id, .. }
            | DropperEvent::ClaimSignerChanged { claim_id, .. }
            | DropperEvent::Claimed { claim_id, .. } => *claim_id,
        }
    }
}

/// Summary of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: H256,

    /// Block the transaction was included in
    pub block_number: u64,

    /// Sender of the transaction
    pub from: Address,

    /// Gas consumed, when the backend reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<U256>,

    /// Dropper events emitted by the transaction
    pub events: Vec<DropperEvent>,
}

impl TxReceipt {
    /// Id carried by the first `ClaimCreated` event, if any
    pub fn created_claim_id(&self) -> Option<ClaimId> {
        self.events.iter().find_map(|event| match event {
            DropperEvent::ClaimCreated { claim_id, .. } => Some(*claim_id),
            _ => None,
        })
    }
}

/// Result of a successful `create_claim`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedClaim {
    /// Newly allocated claim id
    pub claim_id: ClaimId,

    /// Receipt of the creating transaction
    pub receipt: TxReceipt,
}

impl CreatedClaim {
    /// Extract the created claim from a receipt
    pub fn from_receipt(receipt: TxReceipt) -> Result<Self> {
        let claim_id = receipt
            .created_claim_id()
            .ok_or_else(|| Error::chain(format!(
                "Transaction {:?} did not emit ClaimCreated",
                receipt.tx_hash
            )))?;

        Ok(Self { claim_id, receipt })
    }
}
