//! Clients for the mock token contracts the Dropper is exercised with

use std::sync::Arc;

use dropper_common::{Error, Result};
use dropper_core::TxReceipt;
use ethers::abi::Detokenize;
use ethers::contract::ContractCall;
use ethers::providers::Middleware;
use ethers::types::{Address, Bytes, TransactionReceipt, U256};

use crate::artifacts::ContractArtifact;
use crate::bindings::{MockERC721, MockErc20, MockTerminus};
use crate::errors::contract_error;
use crate::transaction::{deploy_contract, send_call, TransactionConfig};

/// Name of the ERC-20 build artifact
pub const ERC20_ARTIFACT: &str = "MockErc20";

/// Name of the ERC-721 build artifact
pub const ERC721_ARTIFACT: &str = "MockERC721";

/// Name of the Terminus build artifact
pub const TERMINUS_ARTIFACT: &str = "MockTerminus";

fn token_receipt(receipt: TransactionReceipt) -> TxReceipt {
    TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|number| number.as_u64()).unwrap_or_default(),
        from: receipt.from,
        gas_used: receipt.gas_used,
        events: Vec::new(),
    }
}

fn instantiated<'a, C>(contract: &'a Option<C>, name: &str) -> Result<&'a C> {
    contract
        .as_ref()
        .ok_or_else(|| Error::not_instantiated(format!("{} contract address is not set; deploy it or pass --address", name)))
}

async fn view<M: Middleware + 'static, D: Detokenize>(call: ContractCall<M, D>, operation: &str) -> Result<D> {
    call.call().await.map_err(|e| contract_error(operation, e))
}

/// Client for a `MockErc20` token
#[derive(Debug, Clone)]
pub struct Erc20Client<M> {
    client: Arc<M>,
    contract: Option<MockErc20<M>>,
    tx_config: TransactionConfig,
}

impl<M: Middleware + 'static> Erc20Client<M> {
    /// Bind to the token at `address`
    pub fn new(client: Arc<M>, address: Option<Address>) -> Self {
        let contract = address.map(|address| MockErc20::new(address, Arc::clone(&client)));
        Self { client, contract, tx_config: TransactionConfig::default() }
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

    /// Deploy a new token and bind to it
    pub async fn deploy(&mut self, artifact: &ContractArtifact) -> Result<Address> {
        let address = deploy_contract(Arc::clone(&self.client), artifact, &self.tx_config).await?;
        self.contract = Some(MockErc20::new(address, Arc::clone(&self.client)));
        Ok(address)
    }

    fn contract(&self) -> Result<&MockErc20<M>> {
        instantiated(&self.contract, ERC20_ARTIFACT)
    }

    async fn transact<D: Detokenize>(&self, call: ContractCall<M, D>, operation: &str) -> Result<TxReceipt> {
        send_call(call, &self.tx_config, operation).await.map(token_receipt)
    }

    pub async fn name(&self) -> Result<String> {
        view(self.contract()?.name(), "name").await
    }

    pub async fn symbol(&self) -> Result<String> {
        view(self.contract()?.symbol(), "symbol").await
    }

    pub async fn decimals(&self) -> Result<u8> {
        view(self.contract()?.decimals(), "decimals").await
    }

    pub async fn total_supply(&self) -> Result<U256> {
        view(self.contract()?.total_supply(), "totalSupply").await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        view(self.contract()?.balance_of(account), "balanceOf").await
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        view(self.contract()?.allowance(owner, spender), "allowance").await
    }

    pub async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.approve(spender, amount), "approve").await
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.transfer(to, amount), "transfer").await
    }

    pub async fn transfer_from(&self, from: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.transfer_from(from, to, amount), "transferFrom").await
    }

    pub async fn increase_allowance(&self, spender: Address, added_value: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.increase_allowance(spender, added_value), "increaseAllowance")
            .await
    }

    pub async fn decrease_allowance(&self, spender: Address, subtracted_value: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.decrease_allowance(spender, subtracted_value), "decreaseAllowance")
            .await
    }

    /// Mint `amount` to `account`
    pub async fn mint(&self, account: Address, amount: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.mint(account, amount), "mint").await
    }
}

/// Client for a `MockERC721` token
#[derive(Debug, Clone)]
pub struct Erc721Client<M> {
    client: Arc<M>,
    contract: Option<MockERC721<M>>,
    tx_config: TransactionConfig,
}

impl<M: Middleware + 'static> Erc721Client<M> {
    /// Bind to the token at `address`
    pub fn new(client: Arc<M>, address: Option<Address>) -> Self {
        let contract = address.map(|address| MockERC721::new(address, Arc::clone(&client)));
        Self { client, contract, tx_config: TransactionConfig::default() }
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

    /// Deploy a new token and bind to it
    pub async fn deploy(&mut self, artifact: &ContractArtifact) -> Result<Address> {
        let address = deploy_contract(Arc::clone(&self.client), artifact, &self.tx_config).await?;
        self.contract = Some(MockERC721::new(address, Arc::clone(&self.client)));
        Ok(address)
    }

    fn contract(&self) -> Result<&MockERC721<M>> {
        instantiated(&self.contract, ERC721_ARTIFACT)
    }

    async fn transact<D: Detokenize>(&self, call: ContractCall<M, D>, operation: &str) -> Result<TxReceipt> {
        send_call(call, &self.tx_config, operation).await.map(token_receipt)
    }

    pub async fn approve(&self, to: Address, token_id: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.approve(to, token_id), "approve").await
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        view(self.contract()?.balance_of(owner), "balanceOf").await
    }

    pub async fn get_approved(&self, token_id: U256) -> Result<Address> {
        view(self.contract()?.get_approved(token_id), "getApproved").await
    }

    pub async fn is_approved_for_all(&self, owner: Address, operator: Address) -> Result<bool> {
        view(self.contract()?.is_approved_for_all(owner, operator), "isApprovedForAll").await
    }

    /// Mint token `token_id` to `to`
    pub async fn mint(&self, to: Address, token_id: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.mint(to, token_id), "mint").await
    }

    pub async fn name(&self) -> Result<String> {
        view(self.contract()?.name(), "name").await
    }

    pub async fn owner_of(&self, token_id: U256) -> Result<Address> {
        view(self.contract()?.owner_of(token_id), "ownerOf").await
    }

    /// `safeTransferFrom(address,address,uint256)`
    pub async fn safe_transfer_from(&self, from: Address, to: Address, token_id: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.safe_transfer_from(from, to, token_id), "safeTransferFrom")
            .await
    }

    /// `safeTransferFrom(address,address,uint256,bytes)`
    pub async fn safe_transfer_from_with_data(
        &self,
        from: Address,
        to: Address,
        token_id: U256,
        data: Bytes,
    ) -> Result<TxReceipt> {
        let call = self.contract()?.safe_transfer_from_with_data(from, to, token_id, data);
        self.transact(call, "safeTransferFrom").await
    }

    pub async fn set_approval_for_all(&self, operator: Address, approved: bool) -> Result<TxReceipt> {
        self.transact(self.contract()?.set_approval_for_all(operator, approved), "setApprovalForAll")
            .await
    }

    pub async fn supports_interface(&self, interface_id: [u8; 4]) -> Result<bool> {
        view(self.contract()?.supports_interface(interface_id), "supportsInterface").await
    }

    pub async fn symbol(&self) -> Result<String> {
        view(self.contract()?.symbol(), "symbol").await
    }

    pub async fn token_by_index(&self, index: U256) -> Result<U256> {
        view(self.contract()?.token_by_index(index), "tokenByIndex").await
    }

    pub async fn token_of_owner_by_index(&self, owner: Address, index: U256) -> Result<U256> {
        view(self.contract()?.token_of_owner_by_index(owner, index), "tokenOfOwnerByIndex").await
    }

    pub async fn token_uri(&self, token_id: U256) -> Result<String> {
        view(self.contract()?.token_uri(token_id), "tokenURI").await
    }

    pub async fn total_supply(&self) -> Result<U256> {
        view(self.contract()?.total_supply(), "totalSupply").await
    }

    pub async fn transfer_from(&self, from: Address, to: Address, token_id: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.transfer_from(from, to, token_id), "transferFrom").await
    }
}

/// Client for a `MockTerminus` pool token
#[derive(Debug, Clone)]
pub struct TerminusClient<M> {
    client: Arc<M>,
    contract: Option<MockTerminus<M>>,
    tx_config: TransactionConfig,
}

impl<M: Middleware + 'static> TerminusClient<M> {
    /// Bind to the Terminus contract at `address`
    pub fn new(client: Arc<M>, address: Option<Address>) -> Self {
        let contract = address.map(|address| MockTerminus::new(address, Arc::clone(&client)));
        Self { client, contract, tx_config: TransactionConfig::default() }
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

    /// Deploy a new Terminus contract and bind to it; the sender becomes its controller
    pub async fn deploy(&mut self, artifact: &ContractArtifact) -> Result<Address> {
        let address = deploy_contract(Arc::clone(&self.client), artifact, &self.tx_config).await?;
        self.contract = Some(MockTerminus::new(address, Arc::clone(&self.client)));
        Ok(address)
    }

    fn contract(&self) -> Result<&MockTerminus<M>> {
        instantiated(&self.contract, TERMINUS_ARTIFACT)
    }

    async fn transact<D: Detokenize>(&self, call: ContractCall<M, D>, operation: &str) -> Result<TxReceipt> {
        send_call(call, &self.tx_config, operation).await.map(token_receipt)
    }

    // Payment and pricing

    /// Token pool creation fees are paid in
    pub async fn set_payment_token(&self, payment_token: Address) -> Result<TxReceipt> {
        self.transact(self.contract()?.set_payment_token(payment_token), "setPaymentToken").await
    }

    pub async fn payment_token(&self) -> Result<Address> {
        view(self.contract()?.payment_token(), "paymentToken").await
    }

    /// Price of creating a pool, in payment token units
    pub async fn set_pool_base_price(&self, base_price: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.set_pool_base_price(base_price), "setPoolBasePrice").await
    }

    pub async fn pool_base_price(&self) -> Result<U256> {
        view(self.contract()?.pool_base_price(), "poolBasePrice").await
    }

    // Pools

    pub async fn create_simple_pool(&self, capacity: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.create_simple_pool(capacity), "createSimplePool").await
    }

    pub async fn create_pool_v1(&self, capacity: U256, transferable: bool, burnable: bool) -> Result<TxReceipt> {
        let call = self.contract()?.create_pool_v1(capacity, transferable, burnable);
        self.transact(call, "createPoolV1").await
    }

    pub async fn total_pools(&self) -> Result<U256> {
        view(self.contract()?.total_pools(), "totalPools").await
    }

    pub async fn set_pool_controller(&self, pool_id: U256, controller: Address) -> Result<TxReceipt> {
        self.transact(self.contract()?.set_pool_controller(pool_id, controller), "setPoolController")
            .await
    }

    pub async fn terminus_pool_controller(&self, pool_id: U256) -> Result<Address> {
        view(self.contract()?.terminus_pool_controller(pool_id), "terminusPoolController").await
    }

    pub async fn terminus_pool_capacity(&self, pool_id: U256) -> Result<U256> {
        view(self.contract()?.terminus_pool_capacity(pool_id), "terminusPoolCapacity").await
    }

    pub async fn terminus_pool_supply(&self, pool_id: U256) -> Result<U256> {
        view(self.contract()?.terminus_pool_supply(pool_id), "terminusPoolSupply").await
    }

    pub async fn terminus_controller(&self) -> Result<Address> {
        view(self.contract()?.terminus_controller(), "terminusController").await
    }

    // Balances

    /// Mint `amount` of pool `pool_id` to `to`; the sender must control the pool
    pub async fn mint(&self, to: Address, pool_id: U256, amount: U256, data: Bytes) -> Result<TxReceipt> {
        self.transact(self.contract()?.mint(to, pool_id, amount, data), "mint").await
    }

    pub async fn burn(&self, from: Address, pool_id: U256, amount: U256) -> Result<TxReceipt> {
        self.transact(self.contract()?.burn(from, pool_id, amount), "burn").await
    }

    pub async fn balance_of(&self, account: Address, pool_id: U256) -> Result<U256> {
        view(self.contract()?.balance_of(account, pool_id), "balanceOf").await
    }

    pub async fn set_approval_for_all(&self, operator: Address, approved: bool) -> Result<TxReceipt> {
        self.transact(self.contract()?.set_approval_for_all(operator, approved), "setApprovalForAll")
            .await
    }

    pub async fn is_approved_for_all(&self, account: Address, operator: Address) -> Result<bool> {
        view(self.contract()?.is_approved_for_all(account, operator), "isApprovedForAll").await
    }

    pub async fn approve_for_pool(&self, pool_id: U256, operator: Address) -> Result<TxReceipt> {
        self.transact(self.contract()?.approve_for_pool(pool_id, operator), "approveForPool").await
    }

    pub async fn is_approved_for_pool(&self, pool_id: U256, operator: Address) -> Result<bool> {
        view(self.contract()?.is_approved_for_pool(pool_id, operator), "isApprovedForPool").await
    }

    pub async fn safe_transfer_from(
        &self,
        from: Address,
        to: Address,
        pool_id: U256,
        amount: U256,
        data: Bytes,
    ) -> Result<TxReceipt> {
        let call = self.contract()?.safe_transfer_from(from, to, pool_id, amount, data);
        self.transact(call, "safeTransferFrom").await
    }

    // Metadata

    pub async fn uri(&self, pool_id: U256) -> Result<String> {
        view(self.contract()?.uri(pool_id), "uri").await
    }

    pub async fn set_uri(&self, pool_id: U256, pool_uri: String) -> Result<TxReceipt> {
        self.transact(self.contract()?.set_uri(pool_id, pool_uri), "setURI").await
    }
}
