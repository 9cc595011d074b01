//! Claim creation, status and signer management

mod common;

use common::Fixture;
use dropper_core::{ClaimRegistry, ClaimTerms, ClaimType, Error};
use ethers::signers::Signer;
use ethers::types::{Address, U256};

#[tokio::test]
async fn test_claim_creation() {
    let fixture = Fixture::new();

    let num_claims_0 = fixture.dropper.num_claims().await.unwrap();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;
    let num_claims_1 = fixture.dropper.num_claims().await.unwrap();

    assert_eq!(num_claims_1, num_claims_0 + 1);
    assert_eq!(claim_id, num_claims_1);

    let claim_info = fixture.dropper.get_claim(claim_id).await.unwrap();
    assert_eq!(
        claim_info.as_tuple(),
        (U256::from(20), fixture.erc20, U256::zero(), U256::one())
    );
}

#[tokio::test]
async fn test_claim_ids_are_sequential() {
    let fixture = Fixture::new();

    for expected in 1..=3u64 {
        let claim_id = fixture
            .create_claim_and_return_claim_id(ClaimType::Erc721, fixture.nft, U256::from(expected), U256::one())
            .await;
        assert_eq!(claim_id, U256::from(expected));
    }
    assert_eq!(fixture.dropper.num_claims().await.unwrap(), U256::from(3));
}

#[tokio::test]
async fn test_claim_creation_fails_from_non_owner() {
    let fixture = Fixture::new();

    let num_claims_0 = fixture.dropper.num_claims().await.unwrap();
    let result = fixture
        .dropper_as_other()
        .create_claim(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;
    assert!(matches!(result, Err(Error::Authorization(_))));

    let num_claims_1 = fixture.dropper.num_claims().await.unwrap();
    assert_eq!(num_claims_1, num_claims_0);
}

#[tokio::test]
async fn test_missing_claims_are_not_found() {
    let fixture = Fixture::new();
    fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;

    for claim_id in [U256::zero(), U256::from(2)] {
        assert!(matches!(fixture.dropper.get_claim(claim_id).await, Err(Error::NotFound(_))));
        assert!(matches!(fixture.dropper.claim_status(claim_id).await, Err(Error::NotFound(_))));
    }
    assert_eq!(fixture.dropper.get_signer_for_claim(U256::from(2)).await.unwrap(), Address::zero());
}

#[tokio::test]
async fn test_claim_status_for_new_claim() {
    let fixture = Fixture::new();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;

    assert!(fixture.dropper.claim_status(claim_id).await.unwrap());
}

#[tokio::test]
async fn test_claim_status_can_be_changed_by_owner() {
    let fixture = Fixture::new();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;
    assert!(fixture.dropper.claim_status(claim_id).await.unwrap());

    let receipt = fixture.dropper.set_claim_status(claim_id, false).await.unwrap();
    assert_eq!(receipt.events.len(), 1);
    assert!(!fixture.dropper.claim_status(claim_id).await.unwrap());

    // Setting the same value again is a no-op for the caller
    fixture.dropper.set_claim_status(claim_id, false).await.unwrap();
    assert!(!fixture.dropper.claim_status(claim_id).await.unwrap());
}

#[tokio::test]
async fn test_claim_status_cannot_be_changed_by_non_owner() {
    let fixture = Fixture::new();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;
    assert!(fixture.dropper.claim_status(claim_id).await.unwrap());

    let result = fixture.dropper_as_other().set_claim_status(claim_id, false).await;
    assert!(matches!(result, Err(Error::Authorization(_))));

    assert!(fixture.dropper.claim_status(claim_id).await.unwrap());
}

#[tokio::test]
async fn test_owner_can_set_signer() {
    let fixture = Fixture::new();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;
    assert_eq!(fixture.dropper.get_signer_for_claim(claim_id).await.unwrap(), Address::zero());

    fixture
        .dropper
        .set_signer_for_claim(claim_id, fixture.signer_0.address())
        .await
        .unwrap();
    assert_eq!(
        fixture.dropper.get_signer_for_claim(claim_id).await.unwrap(),
        fixture.signer_0.address()
    );

    // A later signer overwrites the earlier one
    fixture
        .dropper
        .set_signer_for_claim(claim_id, fixture.signer_1.address())
        .await
        .unwrap();
    assert_eq!(
        fixture.dropper.get_signer_for_claim(claim_id).await.unwrap(),
        fixture.signer_1.address()
    );
}

#[tokio::test]
async fn test_non_owner_cannot_set_signer() {
    let fixture = Fixture::new();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc20, fixture.erc20, U256::zero(), U256::one())
        .await;
    assert_eq!(fixture.dropper.get_signer_for_claim(claim_id).await.unwrap(), Address::zero());

    let result = fixture
        .dropper_as_other()
        .set_signer_for_claim(claim_id, fixture.signer_0.address())
        .await;
    assert!(matches!(result, Err(Error::Authorization(_))));

    assert_eq!(fixture.dropper.get_signer_for_claim(claim_id).await.unwrap(), Address::zero());
}

#[tokio::test]
async fn test_claim_terms_are_immutable_across_admin_updates() {
    let fixture = Fixture::new();
    let claim_id = fixture
        .create_claim_and_return_claim_id(ClaimType::Erc721, fixture.nft, U256::from(2), U256::one())
        .await;
    let before = fixture.dropper.get_claim(claim_id).await.unwrap();

    fixture.dropper.set_claim_status(claim_id, false).await.unwrap();
    fixture
        .dropper
        .set_signer_for_claim(claim_id, fixture.signer_0.address())
        .await
        .unwrap();

    let after = fixture.dropper.get_claim(claim_id).await.unwrap();
    assert_eq!(before, after);
    assert_eq!(
        after,
        ClaimTerms {
            claim_type: ClaimType::Erc721,
            token_address: fixture.nft,
            token_id: U256::from(2),
            amount: U256::one(),
        }
    );
}
