//! Signature-authorized claim redemption

mod common;

use common::Fixture;
use dropper_core::{sign_claim_message, ClaimId, ClaimRegistry, ClaimType, DropperEvent, Error};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, U256};

/// Sign a redemption of `claim_id` for `claimant` valid for `blocks_ahead` more blocks
async fn authorize(
    fixture: &Fixture,
    signer: &LocalWallet,
    claim_id: ClaimId,
    claimant: Address,
    blocks_ahead: u64,
) -> (U256, Bytes) {
    let deadline = U256::from(fixture.ledger.block_number().unwrap() + blocks_ahead);
    let hash = fixture
        .dropper
        .claim_message_hash(claim_id, claimant, deadline)
        .await
        .unwrap();
    (deadline, sign_claim_message(signer, hash).unwrap())
}

async fn erc20_claim(fixture: &Fixture, amount: u64) -> ClaimId {
    let ledger = &fixture.ledger;
    ledger
        .erc20_transfer(fixture.admin, fixture.erc20, fixture.dropper.address(), U256::from(10))
        .unwrap();

    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::from(amount))
        .await;
    fixture
        .dropper
        .set_signer_for_claim(claim_id, fixture.signer_0.address())
        .await
        .unwrap();
    claim_id
}

#[tokio::test]
async fn test_claim_erc20() {
    let fixture = Fixture::new();
    let claim_id = erc20_claim(&fixture, 3).await;
    let claimant = fixture.dropper_as_other();

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    let receipt = claimant.claim(claim_id, deadline, signature).await.unwrap();

    assert_eq!(
        receipt.events,
        vec![DropperEvent::Claimed { claim_id, claimant: fixture.other }]
    );
    assert_eq!(
        fixture.ledger.erc20_balance_of(fixture.erc20, fixture.other).unwrap(),
        U256::from(3)
    );
    assert_eq!(
        fixture.ledger.erc20_balance_of(fixture.erc20, fixture.dropper.address()).unwrap(),
        U256::from(7)
    );
    assert!(fixture.dropper.redemption_status(claim_id, fixture.other).await.unwrap());
    assert!(!fixture.dropper.redemption_status(claim_id, fixture.admin).await.unwrap());
}

#[tokio::test]
async fn test_claim_cannot_be_redeemed_twice() {
    let fixture = Fixture::new();
    let claim_id = erc20_claim(&fixture, 1).await;
    let claimant = fixture.dropper_as_other();

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    claimant.claim(claim_id, deadline, signature.clone()).await.unwrap();

    let result = claimant.claim(claim_id, deadline, signature).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(
        fixture.ledger.erc20_balance_of(fixture.erc20, fixture.other).unwrap(),
        U256::one()
    );
}

#[tokio::test]
async fn test_claim_with_wrong_signer_fails() {
    let fixture = Fixture::new();
    let claim_id = erc20_claim(&fixture, 1).await;

    let (deadline, signature) = authorize(&fixture, &fixture.signer_1, claim_id, fixture.other, 10).await;
    let result = fixture.dropper_as_other().claim(claim_id, deadline, signature).await;

    assert!(matches!(result, Err(Error::Authorization(_))));
    assert!(!fixture.dropper.redemption_status(claim_id, fixture.other).await.unwrap());
}

#[tokio::test]
async fn test_signature_is_bound_to_claimant() {
    let fixture = Fixture::new();
    let claim_id = erc20_claim(&fixture, 1).await;

    // Signed for the admin, presented by someone else
    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.admin, 10).await;
    let result = fixture.dropper_as_other().claim(claim_id, deadline, signature).await;
    assert!(matches!(result, Err(Error::Authorization(_))));
}

#[tokio::test]
async fn test_malformed_signature_is_unauthorized() {
    let fixture = Fixture::new();
    let claim_id = erc20_claim(&fixture, 1).await;
    let deadline = U256::from(fixture.ledger.block_number().unwrap() + 10);

    let result = fixture
        .dropper_as_other()
        .claim(claim_id, deadline, Bytes::from(vec![0u8; 12]))
        .await;
    assert!(matches!(result, Err(Error::Authorization(_))));
    assert!(!fixture.dropper.redemption_status(claim_id, fixture.other).await.unwrap());
}

#[tokio::test]
async fn test_claim_without_signer_fails() {
    let fixture = Fixture::new();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    let result = fixture.dropper_as_other().claim(claim_id, deadline, signature).await;
    assert!(matches!(result, Err(Error::Authorization(_))));
}

#[tokio::test]
async fn test_claim_after_deadline_fails() {
    let fixture = Fixture::new();
    let claim_id = erc20_claim(&fixture, 1).await;

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 2).await;
    fixture.ledger.advance_blocks(5).unwrap();

    let result = fixture.dropper_as_other().claim(claim_id, deadline, signature).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_inactive_claim_cannot_be_redeemed() {
    let fixture = Fixture::new();
    let claim_id = erc20_claim(&fixture, 1).await;
    fixture.dropper.set_claim_status(claim_id, false).await.unwrap();

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    let result = fixture.dropper_as_other().claim(claim_id, deadline, signature).await;
    assert!(matches!(result, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_claim_fails_when_escrow_is_short() {
    let fixture = Fixture::new();
    // Escrow holds 10, claim pays 11
    let claim_id = erc20_claim(&fixture, 11).await;
    let block = fixture.ledger.block_number().unwrap();

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    let result = fixture.dropper_as_other().claim(claim_id, deadline, signature).await;

    assert!(matches!(result, Err(Error::InsufficientBalance(_))));
    assert_eq!(fixture.ledger.block_number().unwrap(), block);
    assert!(!fixture.dropper.redemption_status(claim_id, fixture.other).await.unwrap());
}

#[tokio::test]
async fn test_claim_erc721() {
    let fixture = Fixture::new();
    let dropper = fixture.dropper.address();
    fixture
        .ledger
        .erc721_transfer_from(fixture.admin, fixture.nft, fixture.admin, dropper, U256::from(4))
        .unwrap();

    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc721, fixture.nft, U256::from(4), U256::one())
        .await;
    fixture
        .dropper
        .set_signer_for_claim(claim_id, fixture.signer_0.address())
        .await
        .unwrap();

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    fixture.dropper_as_other().claim(claim_id, deadline, signature).await.unwrap();

    assert_eq!(fixture.ledger.erc721_owner_of(fixture.nft, U256::from(4)).unwrap(), fixture.other);
}

#[tokio::test]
async fn test_claim_terminus_mintable() {
    let fixture = Fixture::new();
    let (ledger, terminus, dropper) = (&fixture.ledger, fixture.terminus, fixture.dropper.address());

    let (pool_id, _) = ledger.terminus_create_pool(fixture.admin, terminus, U256::from(5)).unwrap();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::TerminusMintable, terminus, pool_id, U256::from(2))
        .await;
    fixture
        .dropper
        .set_signer_for_claim(claim_id, fixture.signer_0.address())
        .await
        .unwrap();

    // The dropper cannot mint until it controls the pool
    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    let result = fixture.dropper_as_other().claim(claim_id, deadline, signature.clone()).await;
    assert!(matches!(result, Err(Error::Reverted(_))));

    ledger
        .terminus_set_pool_controller(fixture.admin, terminus, pool_id, dropper)
        .unwrap();
    fixture.dropper_as_other().claim(claim_id, deadline, signature).await.unwrap();

    assert_eq!(ledger.terminus_balance_of(terminus, fixture.other, pool_id).unwrap(), U256::from(2));
    assert_eq!(ledger.terminus_pool_supply(terminus, pool_id).unwrap(), U256::from(2));
}

#[tokio::test]
async fn test_claim_erc1155() {
    let fixture = Fixture::new();
    let (ledger, terminus, dropper) = (&fixture.ledger, fixture.terminus, fixture.dropper.address());

    let (pool_id, _) = ledger.terminus_create_pool(fixture.admin, terminus, U256::from(10)).unwrap();
    ledger.terminus_mint(fixture.admin, terminus, dropper, pool_id, U256::from(6)).unwrap();

    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc1155, terminus, pool_id, U256::from(4))
        .await;
    fixture
        .dropper
        .set_signer_for_claim(claim_id, fixture.signer_0.address())
        .await
        .unwrap();

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claim_id, fixture.other, 10).await;
    let receipt = fixture.dropper_as_other().claim(claim_id, deadline, signature).await.unwrap();

    assert_eq!(receipt.events, vec![DropperEvent::Claimed { claim_id, claimant: fixture.other }]);
    assert_eq!(ledger.terminus_balance_of(terminus, fixture.other, pool_id).unwrap(), U256::from(4));
    assert_eq!(ledger.terminus_balance_of(terminus, dropper, pool_id).unwrap(), U256::from(2));
    // Transfers out of escrow mint nothing
    assert_eq!(ledger.terminus_pool_supply(terminus, pool_id).unwrap(), U256::from(6));
}

#[tokio::test]
async fn test_overflowing_mint_reverts_and_ledger_stays_usable() {
    let fixture = Fixture::new();
    let (ledger, terminus, dropper) = (&fixture.ledger, fixture.terminus, fixture.dropper.address());

    let (pool_id, _) = ledger.terminus_create_pool(fixture.admin, terminus, U256::from(5)).unwrap();
    ledger
        .terminus_set_pool_controller(fixture.admin, terminus, pool_id, dropper)
        .unwrap();

    let mut claims = Vec::new();
    for amount in [U256::one(), U256::MAX] {
        let claim_id = fixture
            .create_claim_and_return_claim_id(ClaimType::TerminusMintable, terminus, pool_id, amount)
            .await;
        fixture
            .dropper
            .set_signer_for_claim(claim_id, fixture.signer_0.address())
            .await
            .unwrap();
        claims.push(claim_id);
    }

    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claims[0], fixture.other, 10).await;
    fixture.dropper_as_other().claim(claims[0], deadline, signature).await.unwrap();

    let block_before = ledger.block_number().unwrap();
    let (deadline, signature) = authorize(&fixture, &fixture.signer_0, claims[1], fixture.other, 10).await;
    let result = fixture.dropper_as_other().claim(claims[1], deadline, signature).await;
    assert!(matches!(result, Err(Error::Reverted(_))));

    assert_eq!(ledger.block_number().unwrap(), block_before);
    assert_eq!(fixture.dropper.num_claims().await.unwrap(), U256::from(2));
    assert_eq!(ledger.terminus_pool_supply(terminus, pool_id).unwrap(), U256::one());
    assert!(!fixture.dropper.redemption_status(claims[1], fixture.other).await.unwrap());
}
