//! Per-transaction overrides and submission

use dropper_common::{Error, Result};
use std::sync::Arc;

use ethers::abi::Detokenize;
use ethers::contract::{ContractCall, ContractFactory};
use ethers::providers::Middleware;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, U256, U64};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::artifacts::ContractArtifact;
use crate::errors::contract_error;

/// Overrides applied to every transaction a client submits.
/// Unset fields are left to the middleware to fill in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionConfig {
    /// Gas price (legacy pricing)
    pub gas_price: Option<U256>,

    /// EIP-1559 max fee per gas
    pub max_fee_per_gas: Option<U256>,

    /// EIP-1559 max priority fee per gas
    pub max_priority_fee_per_gas: Option<U256>,

    /// Confirmations to await before a transaction counts as mined
    pub confirmations: Option<usize>,

    /// Explicit sender nonce
    pub nonce: Option<U256>,

    /// Wei sent along with the call
    pub value: Option<U256>,
}

impl TransactionConfig {
    /// Reject contradictory fee settings
    pub fn validate(&self) -> Result<()> {
        if self.gas_price.is_some()
            && (self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some())
        {
            return Err(Error::validation(
                "gas price cannot be combined with EIP-1559 fee settings",
            ));
        }
        if let (Some(max_fee), Some(priority_fee)) = (self.max_fee_per_gas, self.max_priority_fee_per_gas) {
            if priority_fee > max_fee {
                return Err(Error::validation(format!(
                    "max priority fee per gas {} exceeds max fee per gas {}",
                    priority_fee, max_fee
                )));
            }
        }
        Ok(())
    }

    /// Confirmations to await, defaulting to `default`
    pub fn confirmations_or(&self, default: usize) -> usize {
        self.confirmations.unwrap_or(default)
    }

    /// Write the overrides into a transaction request
    pub fn apply_to(&self, tx: &mut TypedTransaction) {
        if let Some(nonce) = self.nonce {
            tx.set_nonce(nonce);
        }
        if let Some(value) = self.value {
            tx.set_value(value);
        }
        if let Some(gas_price) = self.gas_price {
            tx.set_gas_price(gas_price);
        }
        if let TypedTransaction::Eip1559(inner) = tx {
            if let Some(max_fee) = self.max_fee_per_gas {
                inner.max_fee_per_gas = Some(max_fee);
            }
            if let Some(priority_fee) = self.max_priority_fee_per_gas {
                inner.max_priority_fee_per_gas = Some(priority_fee);
            }
        } else if self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some() {
            warn!("EIP-1559 fee overrides ignored for non EIP-1559 transaction");
        }
    }

    /// A contract call with the overrides applied
    pub fn apply<M: Middleware, D: Detokenize>(&self, mut call: ContractCall<M, D>) -> ContractCall<M, D> {
        self.apply_to(&mut call.tx);
        call
    }
}

/// Submit `call` and wait for its receipt.
///
/// A receipt with a failed status is reported as `Error::Reverted`.
pub async fn send_call<M, D>(
    call: ContractCall<M, D>,
    config: &TransactionConfig,
    operation: &str,
) -> Result<TransactionReceipt>
where
    M: Middleware + 'static,
    D: Detokenize,
{
    config.validate()?;
    let call = config.apply(call);
    let confirmations = config.confirmations_or(1);

    let pending = call.send().await.map_err(|e| contract_error(operation, e))?;
    let tx_hash = *pending;
    info!(operation, ?tx_hash, confirmations, "Submitted transaction");

    let receipt = pending
        .confirmations(confirmations)
        .await
        .map_err(|e| Error::chain(format!("Failed waiting for {} ({:?}): {}", operation, tx_hash, e)))?
        .ok_or_else(|| Error::chain(format!("Transaction {:?} for {} was dropped", tx_hash, operation)))?;

    if receipt.status == Some(U64::zero()) {
        return Err(Error::reverted(format!("{} ({:?}) reverted", operation, tx_hash)));
    }

    debug!(operation, ?tx_hash, block = ?receipt.block_number, gas_used = ?receipt.gas_used, "Transaction mined");
    Ok(receipt)
}

/// Deploy `artifact` (no constructor arguments) and return the new address.
/// The sender becomes the contract owner.
pub async fn deploy_contract<M: Middleware + 'static>(
    client: Arc<M>,
    artifact: &ContractArtifact,
    config: &TransactionConfig,
) -> Result<Address> {
    config.validate()?;
    let operation = format!("deploy {}", artifact.name);

    let factory = ContractFactory::new(artifact.abi.clone(), artifact.bytecode.clone(), client);
    let mut deployer = factory
        .deploy(())
        .map_err(|e| contract_error(&operation, e))?
        .confirmations(config.confirmations_or(1));
    config.apply_to(&mut deployer.tx);

    let deployed = deployer.send().await.map_err(|e| contract_error(&operation, e))?;
    let address = deployed.address();
    info!(contract = %artifact.name, ?address, "Deployed contract");
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::{Eip1559TransactionRequest, TransactionRequest};

    #[test]
    fn test_validate_rejects_mixed_pricing() {
        let config = TransactionConfig {
            gas_price: Some(U256::from(10)),
            max_fee_per_gas: Some(U256::from(20)),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        let config = TransactionConfig {
            max_fee_per_gas: Some(U256::from(20)),
            max_priority_fee_per_gas: Some(U256::from(30)),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        assert!(TransactionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_apply_eip1559_fees() {
        let config = TransactionConfig {
            max_fee_per_gas: Some(U256::from(100)),
            max_priority_fee_per_gas: Some(U256::from(2)),
            nonce: Some(U256::from(7)),
            value: Some(U256::from(1000)),
            ..Default::default()
        };
        let mut tx = TypedTransaction::Eip1559(Eip1559TransactionRequest::new());
        config.apply_to(&mut tx);

        assert_eq!(tx.nonce(), Some(&U256::from(7)));
        assert_eq!(tx.value(), Some(&U256::from(1000)));
        match tx {
            TypedTransaction::Eip1559(inner) => {
                assert_eq!(inner.max_fee_per_gas, Some(U256::from(100)));
                assert_eq!(inner.max_priority_fee_per_gas, Some(U256::from(2)));
            }
            other => panic!("unexpected transaction type: {:?}", other),
        }
    }

    #[test]
    fn test_apply_gas_price_to_legacy() {
        let config = TransactionConfig {
            gas_price: Some(U256::from(42)),
            ..Default::default()
        };
        let mut tx = TypedTransaction::Legacy(TransactionRequest::new());
        config.apply_to(&mut tx);
        assert_eq!(tx.gas_price(), Some(U256::from(42)));
        assert_eq!(tx.nonce(), None);
    }

    #[test]
    fn test_eip1559_fees_leave_legacy_untouched() {
        let config = TransactionConfig {
            max_fee_per_gas: Some(U256::from(100)),
            max_priority_fee_per_gas: Some(U256::from(2)),
            nonce: Some(U256::from(7)),
            ..Default::default()
        };
        let mut tx = TypedTransaction::Legacy(TransactionRequest::new());
        config.apply_to(&mut tx);
        assert_eq!(tx.gas_price(), None);
        assert_eq!(tx.nonce(), Some(&U256::from(7)));
    }

    #[test]
    fn test_confirmations_default() {
        assert_eq!(TransactionConfig::default().confirmations_or(3), 3);
        let config = TransactionConfig { confirmations: Some(0), ..Default::default() };
        assert_eq!(config.confirmations_or(3), 0);
    }
}
