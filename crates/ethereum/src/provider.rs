use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dropper_common::{Error, Result};
use ethers::middleware::{Middleware, SignerMiddleware};
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::SignerClient;

/// Configuration for the Ethereum provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumProviderConfig {
    /// RPC URL
    pub rpc_url: String,

    /// Expected chain id; checked against the node when set
    pub chain_id: Option<u64>,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// How often pending transactions are polled (in milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for EthereumProviderConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: None,
            request_timeout_secs: 30,
            poll_interval_ms: 1000,
        }
    }
}

/// HTTP connection to an Ethereum node
#[derive(Debug, Clone)]
pub struct EthereumProvider {
    provider: Arc<Provider<Http>>,
    config: EthereumProviderConfig,
}

impl EthereumProvider {
    /// Create a new Ethereum provider. No request is made until the first call.
    pub fn new(config: EthereumProviderConfig) -> Result<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| Error::config(format!("Invalid RPC URL {}: {}", config.rpc_url, e)))?
            .interval(Duration::from_millis(config.poll_interval_ms));

        Ok(Self {
            provider: Arc::new(provider),
            config,
        })
    }

    /// Underlying ethers provider
    pub fn provider(&self) -> Arc<Provider<Http>> {
        Arc::clone(&self.provider)
    }

    /// Provider configuration
    pub fn config(&self) -> &EthereumProviderConfig {
        &self.config
    }

    /// Chain id reported by the node, checked against the configured one
    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self
            .with_timeout("eth_chainId", self.provider.get_chainid())
            .await?
            .as_u64();

        if let Some(expected) = self.config.chain_id {
            if expected != chain_id {
                return Err(Error::config(format!(
                    "Node at {} reports chain id {} but {} is configured",
                    self.config.rpc_url, chain_id, expected
                )));
            }
        }
        Ok(chain_id)
    }

    /// Get latest block number
    pub async fn latest_block_number(&self) -> Result<u64> {
        let block_number = self
            .with_timeout("eth_blockNumber", self.provider.get_block_number())
            .await?;
        Ok(block_number.as_u64())
    }

    /// Middleware that signs transactions with `wallet`
    pub async fn signer(&self, wallet: LocalWallet) -> Result<Arc<SignerClient>> {
        let chain_id = self.chain_id().await?;
        let wallet = wallet.with_chain_id(chain_id);
        info!(address = ?wallet.address(), chain_id, "Connected transaction sender");
        Ok(Arc::new(SignerMiddleware::new((*self.provider).clone(), wallet)))
    }

    async fn with_timeout<T, E, F>(&self, request: &str, future: F) -> Result<T>
    where
        E: std::fmt::Display,
        F: Future<Output = std::result::Result<T, E>>,
    {
        debug!(request, rpc_url = %self.config.rpc_url, "Sending request");
        let timeout = Duration::from_secs(self.config.request_timeout_secs);
        tokio::time::timeout(timeout, future)
            .await
            .map_err(|_| Error::chain(format!("{} timed out after {:?}", request, timeout)))?
            .map_err(|e| Error::chain(format!("{} failed: {}", request, e)))
    }
}
