//! Shared fixture for the dropper workflow tests
#![allow(dead_code)]

use std::sync::Arc;

use dropper_core::{ClaimId, ClaimRegistry, ClaimType, MemoryDropper, MemoryLedger};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};

// Default local development accounts
pub const ADMIN_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const OTHER_KEY: &str = "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const SIGNER_0_KEY: &str = "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";
pub const SIGNER_1_KEY: &str = "7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6";

pub fn wallet(key: &str) -> LocalWallet {
    key.parse::<LocalWallet>().unwrap().with_chain_id(31337u64)
}

/// Ledger with a dropper, an ERC-20 (100e18 minted to the admin), an ERC-721
/// (tokens 1..=4 minted to the admin) and a Terminus contract
pub struct Fixture {
    pub ledger: Arc<MemoryLedger>,
    pub admin: Address,
    pub other: Address,
    pub signer_0: LocalWallet,
    pub signer_1: LocalWallet,
    pub dropper: MemoryDropper,
    pub erc20: Address,
    pub nft: Address,
    pub terminus: Address,
}

impl Fixture {
    pub fn new() -> Self {
        let ledger = Arc::new(MemoryLedger::default());
        let admin = wallet(ADMIN_KEY).address();
        let other = wallet(OTHER_KEY).address();

        let erc20 = ledger.deploy_erc20(admin).unwrap();
        let supply = U256::from(100) * U256::exp10(18);
        ledger.erc20_mint(admin, erc20, admin, supply).unwrap();

        let nft = ledger.deploy_erc721(admin).unwrap();
        for token_id in 1..=4u64 {
            ledger.erc721_mint(admin, nft, admin, U256::from(token_id)).unwrap();
        }

        let terminus = ledger.deploy_terminus(admin).unwrap();

        let dropper_address = ledger.deploy_dropper(admin).unwrap();
        let dropper = ledger.dropper(dropper_address, admin);

        Self {
            ledger,
            admin,
            other,
            signer_0: wallet(SIGNER_0_KEY),
            signer_1: wallet(SIGNER_1_KEY),
            dropper,
            erc20,
            nft,
            terminus,
        }
    }

    /// The dropper as seen by a non-administrator
    pub fn dropper_as_other(&self) -> MemoryDropper {
        self.dropper.connect(self.other)
    }

    /// Create a claim as the admin and read its id back from the
    /// `ClaimCreated` event in the creation block
    pub async fn create_claim_and_return_claim_id(
        &self,
        claim_type: ClaimType,
        token_address: Address,
        token_id: U256,
        amount: U256,
    ) -> ClaimId {
        let created = self
            .dropper
            .create_claim(claim_type, token_address, token_id, amount)
            .await
            .unwrap();

        let block = created.receipt.block_number;
        let events = self.ledger.events(block, block).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event.name(), "ClaimCreated");
        assert_eq!(events[0].address, self.dropper.address());
        events[0].event.claim_id()
    }
}
