/// Claim workflow core: types, service traits and the in-memory ledger
pub mod types;
pub mod service;
pub mod signature;
pub mod memory;

/// Re-export common types from dropper-common
pub use dropper_common::{Error, Result};

pub use memory::{LoggedEvent, MemoryDropper, MemoryLedger};
pub use service::{check_claim_id, Administered, AssetEscrow, ClaimRegistry};
pub use signature::{recover_claim_signer, sign_claim_message, ClaimDomain};
pub use types::{Claim, ClaimId, ClaimTerms, ClaimType, CreatedClaim, DropperEvent, TxReceipt};
