/// In-memory ledger for testing the claim workflow without a node
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dropper_common::{Error, Result};
use ethers::types::{Address, Bytes, H256, U256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::service::{check_claim_id, Administered, AssetEscrow, ClaimRegistry};
use crate::signature::{recover_claim_signer, ClaimDomain};
use crate::types::{Claim, ClaimId, ClaimTerms, ClaimType, CreatedClaim, DropperEvent, TxReceipt};

/// Chain id reported by a default ledger (the local development chain id)
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// A dropper event together with where it was emitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// Block that included the emitting transaction
    pub block_number: u64,

    /// Emitting transaction
    pub tx_hash: H256,

    /// Emitting dropper
    pub address: Address,

    /// Decoded event
    pub event: DropperEvent,
}

/// Ledger executing every transaction atomically, one at a time.
///
/// Each transaction runs against a staged copy of the state and is committed
/// only if it succeeds, so a rejected transaction changes nothing.
pub struct MemoryLedger {
    /// Chain id used in signing domains
    chain_id: u64,

    /// Ledger state
    state: RwLock<LedgerState>,
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    /// Number of the latest mined block
    block_number: u64,

    /// Transactions executed so far (drives tx hashes)
    tx_count: u64,

    /// Contracts deployed so far (drives contract addresses)
    contract_count: u64,

    droppers: HashMap<Address, DropperState>,
    erc20: HashMap<Address, Erc20State>,
    erc721: HashMap<Address, Erc721State>,
    terminus: HashMap<Address, TerminusState>,

    /// Every dropper event, in emission order
    logs: Vec<LoggedEvent>,
}

#[derive(Debug, Clone)]
struct DropperState {
    owner: Address,
    claims: Vec<Claim>,
    redeemed: HashSet<(ClaimId, Address)>,
}

#[derive(Debug, Clone, Default)]
struct Erc20State {
    balances: HashMap<Address, U256>,
    total_supply: U256,
}

#[derive(Debug, Clone, Default)]
struct Erc721State {
    owners: BTreeMap<U256, Address>,
}

#[derive(Debug, Clone)]
struct TerminusState {
    controller: Address,
    pools: Vec<Pool>,
    balances: HashMap<(U256, Address), U256>,
}

#[derive(Debug, Clone)]
struct Pool {
    controller: Address,
    capacity: U256,
    supply: U256,
}

/// Events collected while a transaction runs
type TxLog = Vec<(Address, DropperEvent)>;

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

impl MemoryLedger {
    /// Create an empty ledger for `chain_id`
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: RwLock::new(LedgerState::default()),
        }
    }

    /// Chain id of this ledger
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Number of the latest mined block
    pub fn block_number(&self) -> Result<u64> {
        Ok(self.read()?.block_number)
    }

    /// Mine `count` empty blocks
    pub fn advance_blocks(&self, count: u64) -> Result<()> {
        let mut state = self.write()?;
        state.block_number = state.block_number.saturating_add(count);
        Ok(())
    }

    /// Dropper events emitted in `from_block..=to_block`
    pub fn events(&self, from_block: u64, to_block: u64) -> Result<Vec<LoggedEvent>> {
        let state = self.read()?;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.block_number >= from_block && log.block_number <= to_block)
            .cloned()
            .collect())
    }

    /// Deploy a dropper administered by `owner`
    pub fn deploy_dropper(&self, owner: Address) -> Result<Address> {
        self.deploy(owner, |state, address| {
            state.droppers.insert(address, DropperState {
                owner,
                claims: Vec::new(),
                redeemed: HashSet::new(),
            });
        })
    }

    /// Deploy an ERC-20 token
    pub fn deploy_erc20(&self, owner: Address) -> Result<Address> {
        self.deploy(owner, |state, address| {
            state.erc20.insert(address, Erc20State::default());
        })
    }

    /// Deploy an ERC-721 token
    pub fn deploy_erc721(&self, owner: Address) -> Result<Address> {
        self.deploy(owner, |state, address| {
            state.erc721.insert(address, Erc721State::default());
        })
    }

    /// Deploy a Terminus (ERC-1155 pool) contract controlled by `owner`
    pub fn deploy_terminus(&self, owner: Address) -> Result<Address> {
        self.deploy(owner, |state, address| {
            state.terminus.insert(address, TerminusState {
                controller: owner,
                pools: Vec::new(),
                balances: HashMap::new(),
            });
        })
    }

    /// Bind a dropper to a sender, like connecting a contract to a signer
    pub fn dropper(self: &Arc<Self>, address: Address, sender: Address) -> MemoryDropper {
        MemoryDropper {
            ledger: Arc::clone(self),
            address,
            sender,
        }
    }

    // ERC-20

    /// Mint `amount` to `to`
    pub fn erc20_mint(&self, sender: Address, token: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        self.transact(sender, |state, _| {
            let erc20 = erc20_mut(state, token)?;
            let total_supply = checked_credit(erc20.total_supply, amount)?;
            let balance = checked_credit(erc20.balances.get(&to).copied().unwrap_or_default(), amount)?;
            erc20.total_supply = total_supply;
            erc20.balances.insert(to, balance);
            Ok(())
        })
        .map(|(_, receipt)| receipt)
    }

    /// Transfer `amount` from `sender` to `to`
    pub fn erc20_transfer(&self, sender: Address, token: Address, to: Address, amount: U256) -> Result<TxReceipt> {
        self.transact(sender, |state, _| erc20_move(state, token, sender, to, amount))
            .map(|(_, receipt)| receipt)
    }

    /// Balance of `holder`
    pub fn erc20_balance_of(&self, token: Address, holder: Address) -> Result<U256> {
        let state = self.read()?;
        let erc20 = state.erc20.get(&token).ok_or_else(|| no_contract("ERC20", token))?;
        Ok(erc20.balances.get(&holder).copied().unwrap_or_default())
    }

    /// Total minted supply
    pub fn erc20_total_supply(&self, token: Address) -> Result<U256> {
        let state = self.read()?;
        let erc20 = state.erc20.get(&token).ok_or_else(|| no_contract("ERC20", token))?;
        Ok(erc20.total_supply)
    }

    // ERC-721

    /// Mint token `token_id` to `to`
    pub fn erc721_mint(&self, sender: Address, token: Address, to: Address, token_id: U256) -> Result<TxReceipt> {
        self.transact(sender, |state, _| {
            let erc721 = erc721_mut(state, token)?;
            if erc721.owners.contains_key(&token_id) {
                return Err(Error::reverted(format!("ERC721: token {} already minted", token_id)));
            }
            erc721.owners.insert(token_id, to);
            Ok(())
        })
        .map(|(_, receipt)| receipt)
    }

    /// Transfer token `token_id` from `from` to `to`; `sender` must own it
    pub fn erc721_transfer_from(
        &self,
        sender: Address,
        token: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<TxReceipt> {
        self.transact(sender, |state, _| {
            if sender != from {
                return Err(Error::authorization("ERC721: caller is not token owner"));
            }
            erc721_move(state, token, from, to, token_id)
        })
        .map(|(_, receipt)| receipt)
    }

    /// Owner of token `token_id`
    pub fn erc721_owner_of(&self, token: Address, token_id: U256) -> Result<Address> {
        let state = self.read()?;
        let erc721 = state.erc721.get(&token).ok_or_else(|| no_contract("ERC721", token))?;
        erc721
            .owners
            .get(&token_id)
            .copied()
            .ok_or_else(|| Error::not_found(format!("ERC721: token {} does not exist", token_id)))
    }

    /// Number of tokens owned by `owner`
    pub fn erc721_balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        let state = self.read()?;
        let erc721 = state.erc721.get(&token).ok_or_else(|| no_contract("ERC721", token))?;
        Ok(U256::from(erc721.owners.values().filter(|holder| **holder == owner).count()))
    }

    /// `index`-th token of `owner`, in token id order
    pub fn erc721_token_of_owner_by_index(&self, token: Address, owner: Address, index: usize) -> Result<U256> {
        let state = self.read()?;
        let erc721 = state.erc721.get(&token).ok_or_else(|| no_contract("ERC721", token))?;
        erc721
            .owners
            .iter()
            .filter(|(_, holder)| **holder == owner)
            .map(|(token_id, _)| *token_id)
            .nth(index)
            .ok_or_else(|| Error::not_found("ERC721Enumerable: owner index out of bounds"))
    }

    // Terminus / ERC-1155

    /// Create a pool with `capacity`; only the Terminus controller may do this
    pub fn terminus_create_pool(&self, sender: Address, terminus: Address, capacity: U256) -> Result<(U256, TxReceipt)> {
        self.transact(sender, |state, _| {
            let terminus_state = terminus_mut(state, terminus)?;
            if terminus_state.controller != sender {
                return Err(Error::authorization("TerminusFacet: caller is not the terminus controller"));
            }
            terminus_state.pools.push(Pool {
                controller: sender,
                capacity,
                supply: U256::zero(),
            });
            Ok(U256::from(terminus_state.pools.len()))
        })
    }

    /// Hand control of a pool to `controller`; only the current pool controller may do this
    pub fn terminus_set_pool_controller(
        &self,
        sender: Address,
        terminus: Address,
        pool_id: U256,
        controller: Address,
    ) -> Result<TxReceipt> {
        self.transact(sender, |state, _| {
            let pool = pool_mut(terminus_mut(state, terminus)?, pool_id)?;
            if pool.controller != sender {
                return Err(Error::authorization("TerminusFacet: caller is not the pool controller"));
            }
            pool.controller = controller;
            Ok(())
        })
        .map(|(_, receipt)| receipt)
    }

    /// Mint `amount` of pool `pool_id` to `to`; only the pool controller may do this
    pub fn terminus_mint(
        &self,
        sender: Address,
        terminus: Address,
        to: Address,
        pool_id: U256,
        amount: U256,
    ) -> Result<TxReceipt> {
        self.transact(sender, |state, _| terminus_mint_as(state, terminus, sender, to, pool_id, amount))
            .map(|(_, receipt)| receipt)
    }

    /// Transfer `amount` of pool `pool_id` from `sender` to `to`
    pub fn terminus_safe_transfer_from(
        &self,
        sender: Address,
        terminus: Address,
        to: Address,
        pool_id: U256,
        amount: U256,
    ) -> Result<TxReceipt> {
        self.transact(sender, |state, _| terminus_move(state, terminus, sender, to, pool_id, amount))
            .map(|(_, receipt)| receipt)
    }

    /// Balance of `holder` in pool `pool_id`
    pub fn terminus_balance_of(&self, terminus: Address, holder: Address, pool_id: U256) -> Result<U256> {
        let state = self.read()?;
        let terminus_state = state
            .terminus
            .get(&terminus)
            .ok_or_else(|| no_contract("Terminus", terminus))?;
        Ok(terminus_state.balances.get(&(pool_id, holder)).copied().unwrap_or_default())
    }

    /// Supply minted so far in pool `pool_id`
    pub fn terminus_pool_supply(&self, terminus: Address, pool_id: U256) -> Result<U256> {
        let state = self.read()?;
        let terminus_state = state
            .terminus
            .get(&terminus)
            .ok_or_else(|| no_contract("Terminus", terminus))?;
        let index = pool_index(terminus_state, pool_id)?;
        Ok(terminus_state.pools[index].supply)
    }

    fn deploy(&self, owner: Address, install: impl FnOnce(&mut LedgerState, Address)) -> Result<Address> {
        let (address, _) = self.transact(owner, |state, _| {
            state.contract_count += 1;
            let address = contract_address(owner, state.contract_count);
            install(state, address);
            Ok(address)
        })?;
        debug!(?address, ?owner, "Deployed contract on memory ledger");
        Ok(address)
    }

    /// Run `f` as one transaction from `sender`; commit only if it succeeds
    fn transact<T>(
        &self,
        sender: Address,
        f: impl FnOnce(&mut LedgerState, &mut TxLog) -> Result<T>,
    ) -> Result<(T, TxReceipt)> {
        let mut state = self.write()?;
        let mut staged = (*state).clone();
        let mut emitted = TxLog::new();

        let output = f(&mut staged, &mut emitted)?;

        staged.tx_count += 1;
        staged.block_number += 1;
        let tx_hash = tx_hash(sender, staged.tx_count);
        let block_number = staged.block_number;

        for (address, event) in &emitted {
            staged.logs.push(LoggedEvent {
                block_number,
                tx_hash,
                address: *address,
                event: event.clone(),
            });
        }
        *state = staged;

        Ok((output, TxReceipt {
            tx_hash,
            block_number,
            from: sender,
            gas_used: None,
            events: emitted.into_iter().map(|(_, event)| event).collect(),
        }))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|e| Error::generic(format!("Failed to acquire ledger read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.state
            .write()
            .map_err(|e| Error::generic(format!("Failed to acquire ledger write lock: {}", e)))
    }
}

/// A dropper on the memory ledger bound to one sender
#[derive(Clone)]
pub struct MemoryDropper {
    ledger: Arc<MemoryLedger>,
    address: Address,
    sender: Address,
}

impl MemoryDropper {
    /// Dropper contract address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sender this handle transacts as
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// The same dropper bound to another sender
    pub fn connect(&self, sender: Address) -> Self {
        Self { sender, ..self.clone() }
    }

    /// Underlying ledger
    pub fn ledger(&self) -> &Arc<MemoryLedger> {
        &self.ledger
    }

    /// Signing domain of this dropper
    pub fn domain(&self) -> ClaimDomain {
        ClaimDomain::new(self.ledger.chain_id, self.address)
    }

    /// Run an administrator-only transaction against this dropper
    fn transact_as_owner<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut LedgerState, &mut TxLog) -> Result<T>,
    ) -> Result<(T, TxReceipt)> {
        let (address, sender) = (self.address, self.sender);
        self.ledger.transact(sender, |state, log| {
            let dropper = dropper_ref(state, address)?;
            if dropper.owner != sender {
                return Err(Error::authorization(format!(
                    "Ownable: caller is not the owner ({} by {:?})",
                    operation, sender
                )));
            }
            f(state, log)
        })
    }

    fn read_dropper<T>(&self, f: impl FnOnce(&DropperState) -> Result<T>) -> Result<T> {
        let state = self.ledger.read()?;
        f(dropper_ref(&state, self.address)?)
    }
}

#[async_trait]
impl ClaimRegistry for MemoryDropper {
    async fn create_claim(
        &self,
        claim_type: ClaimType,
        token_address: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<CreatedClaim> {
        let address = self.address;
        let (_, receipt) = self.transact_as_owner("createClaim", |state, log| {
            let dropper = dropper_mut(state, address)?;
            let claim_id = U256::from(dropper.claims.len() + 1);
            dropper.claims.push(Claim {
                id: claim_id,
                terms: ClaimTerms { claim_type, token_address, token_id, amount },
                active: true,
                signer: Address::zero(),
            });
            log.push((address, DropperEvent::ClaimCreated {
                claim_id,
                claim_type: claim_type.into(),
                token_address,
                token_id,
                amount,
            }));
            Ok(())
        })?;

        let created = CreatedClaim::from_receipt(receipt)?;
        debug!(claim_id = %created.claim_id, %claim_type, "Created claim");
        Ok(created)
    }

    async fn get_claim(&self, claim_id: ClaimId) -> Result<ClaimTerms> {
        self.read_dropper(|dropper| Ok(claim_ref(dropper, claim_id)?.terms))
    }

    async fn claim_status(&self, claim_id: ClaimId) -> Result<bool> {
        self.read_dropper(|dropper| Ok(claim_ref(dropper, claim_id)?.active))
    }

    async fn set_claim_status(&self, claim_id: ClaimId, active: bool) -> Result<TxReceipt> {
        let address = self.address;
        self.transact_as_owner("setClaimStatus", |state, log| {
            claim_mut(dropper_mut(state, address)?, claim_id)?.active = active;
            log.push((address, DropperEvent::ClaimStatusChanged { claim_id, status: active }));
            Ok(())
        })
        .map(|(_, receipt)| receipt)
    }

    async fn set_signer_for_claim(&self, claim_id: ClaimId, signer: Address) -> Result<TxReceipt> {
        let address = self.address;
        self.transact_as_owner("setSignerForClaim", |state, log| {
            claim_mut(dropper_mut(state, address)?, claim_id)?.signer = signer;
            log.push((address, DropperEvent::ClaimSignerChanged { claim_id, signer }));
            Ok(())
        })
        .map(|(_, receipt)| receipt)
    }

    async fn get_signer_for_claim(&self, claim_id: ClaimId) -> Result<Address> {
        self.read_dropper(|dropper| {
            Ok(claim_ref(dropper, claim_id).map(|claim| claim.signer).unwrap_or_default())
        })
    }

    async fn num_claims(&self) -> Result<U256> {
        self.read_dropper(|dropper| Ok(U256::from(dropper.claims.len())))
    }

    async fn claim_message_hash(
        &self,
        claim_id: ClaimId,
        claimant: Address,
        block_deadline: U256,
    ) -> Result<H256> {
        Ok(self.domain().claim_message_hash(claim_id, claimant, block_deadline))
    }

    async fn claim(&self, claim_id: ClaimId, block_deadline: U256, signature: Bytes) -> Result<TxReceipt> {
        let (address, claimant, domain) = (self.address, self.sender, self.domain());

        let (_, receipt) = self.ledger.transact(claimant, |state, log| {
            let current_block = U256::from(state.block_number + 1);
            if current_block > block_deadline {
                return Err(Error::validation(format!(
                    "Dropper: claim -- Block deadline {} exceeded",
                    block_deadline
                )));
            }

            let dropper = dropper_ref(state, address)?;
            let claim = claim_ref(dropper, claim_id)?;
            if !claim.active {
                return Err(Error::validation(format!("Dropper: claim -- Claim {} is not active", claim_id)));
            }
            if dropper.redeemed.contains(&(claim_id, claimant)) {
                return Err(Error::validation(format!(
                    "Dropper: claim -- {:?} already claimed {}",
                    claimant, claim_id
                )));
            }

            let message_hash = domain.claim_message_hash(claim_id, claimant, block_deadline);
            let recovered = recover_claim_signer(message_hash, &signature).ok();
            if claim.signer.is_zero() || recovered != Some(claim.signer) {
                return Err(Error::authorization("Dropper: claim -- Invalid signer for claim"));
            }

            let terms = claim.terms;
            match terms.claim_type {
                ClaimType::Erc20 => erc20_move(state, terms.token_address, address, claimant, terms.amount)?,
                ClaimType::Erc721 => erc721_move(state, terms.token_address, address, claimant, terms.token_id)?,
                ClaimType::Erc1155 => {
                    terminus_move(state, terms.token_address, address, claimant, terms.token_id, terms.amount)?
                }
                ClaimType::TerminusMintable => {
                    terminus_mint_as(state, terms.token_address, address, claimant, terms.token_id, terms.amount)?
                }
            }

            dropper_mut(state, address)?.redeemed.insert((claim_id, claimant));
            log.push((address, DropperEvent::Claimed { claim_id, claimant }));
            Ok(())
        })?;

        debug!(%claim_id, ?claimant, "Claim redeemed");
        Ok(receipt)
    }

    async fn redemption_status(&self, claim_id: ClaimId, claimant: Address) -> Result<bool> {
        self.read_dropper(|dropper| Ok(dropper.redeemed.contains(&(claim_id, claimant))))
    }
}

#[async_trait]
impl AssetEscrow for MemoryDropper {
    async fn withdraw_erc20(&self, token_address: Address, amount: U256) -> Result<TxReceipt> {
        let (address, sender) = (self.address, self.sender);
        self.transact_as_owner("withdrawERC20", |state, _| {
            erc20_move(state, token_address, address, sender, amount)
        })
        .map(|(_, receipt)| receipt)
    }

    async fn withdraw_erc721(&self, token_address: Address, token_id: U256) -> Result<TxReceipt> {
        let (address, sender) = (self.address, self.sender);
        self.transact_as_owner("withdrawERC721", |state, _| {
            erc721_move(state, token_address, address, sender, token_id)
        })
        .map(|(_, receipt)| receipt)
    }

    async fn withdraw_erc1155(
        &self,
        token_address: Address,
        token_id: U256,
        amount: U256,
    ) -> Result<TxReceipt> {
        let (address, sender) = (self.address, self.sender);
        self.transact_as_owner("withdrawERC1155", |state, _| {
            terminus_move(state, token_address, address, sender, token_id, amount)
        })
        .map(|(_, receipt)| receipt)
    }
}

#[async_trait]
impl Administered for MemoryDropper {
    async fn owner(&self) -> Result<Address> {
        self.read_dropper(|dropper| Ok(dropper.owner))
    }

    async fn transfer_ownership(&self, new_owner: Address) -> Result<TxReceipt> {
        let address = self.address;
        self.transact_as_owner("transferOwnership", |state, _| {
            if new_owner.is_zero() {
                return Err(Error::validation("Ownable: new owner is the zero address"));
            }
            dropper_mut(state, address)?.owner = new_owner;
            Ok(())
        })
        .map(|(_, receipt)| receipt)
    }
}

fn contract_address(deployer: Address, nonce: u64) -> Address {
    let mut preimage = deployer.as_bytes().to_vec();
    preimage.extend_from_slice(&nonce.to_be_bytes());
    Address::from_slice(&keccak256(preimage)[12..])
}

fn tx_hash(sender: Address, tx_count: u64) -> H256 {
    let mut preimage = sender.as_bytes().to_vec();
    preimage.extend_from_slice(&tx_count.to_be_bytes());
    H256(keccak256(preimage))
}

fn no_contract(kind: &str, address: Address) -> Error {
    Error::reverted(format!("No {} contract at {:?}", kind, address))
}

fn dropper_ref(state: &LedgerState, address: Address) -> Result<&DropperState> {
    state.droppers.get(&address).ok_or_else(|| no_contract("Dropper", address))
}

fn dropper_mut(state: &mut LedgerState, address: Address) -> Result<&mut DropperState> {
    state.droppers.get_mut(&address).ok_or_else(|| no_contract("Dropper", address))
}

fn claim_index(dropper: &DropperState, claim_id: ClaimId) -> Result<usize> {
    check_claim_id(claim_id, U256::from(dropper.claims.len()))?;
    Ok(claim_id.as_usize() - 1)
}

fn claim_ref(dropper: &DropperState, claim_id: ClaimId) -> Result<&Claim> {
    let index = claim_index(dropper, claim_id)?;
    Ok(&dropper.claims[index])
}

fn claim_mut(dropper: &mut DropperState, claim_id: ClaimId) -> Result<&mut Claim> {
    let index = claim_index(dropper, claim_id)?;
    Ok(&mut dropper.claims[index])
}

fn erc20_mut(state: &mut LedgerState, token: Address) -> Result<&mut Erc20State> {
    state.erc20.get_mut(&token).ok_or_else(|| no_contract("ERC20", token))
}

fn erc721_mut(state: &mut LedgerState, token: Address) -> Result<&mut Erc721State> {
    state.erc721.get_mut(&token).ok_or_else(|| no_contract("ERC721", token))
}

fn terminus_mut(state: &mut LedgerState, terminus: Address) -> Result<&mut TerminusState> {
    state.terminus.get_mut(&terminus).ok_or_else(|| no_contract("Terminus", terminus))
}

fn pool_index(terminus: &TerminusState, pool_id: U256) -> Result<usize> {
    if pool_id.is_zero() || pool_id > U256::from(terminus.pools.len()) {
        return Err(Error::not_found(format!("Terminus pool {} does not exist", pool_id)));
    }
    Ok(pool_id.as_usize() - 1)
}

fn pool_mut(terminus: &mut TerminusState, pool_id: U256) -> Result<&mut Pool> {
    let index = pool_index(terminus, pool_id)?;
    Ok(&mut terminus.pools[index])
}

fn erc20_move(state: &mut LedgerState, token: Address, from: Address, to: Address, amount: U256) -> Result<()> {
    let erc20 = erc20_mut(state, token)?;
    let available = erc20.balances.get(&from).copied().unwrap_or_default();
    if available < amount {
        return Err(Error::insufficient_balance(format!(
            "ERC20: transfer amount {} exceeds balance {} of {:?}",
            amount, available, from
        )));
    }
    erc20.balances.insert(from, available - amount);
    let credited = checked_credit(erc20.balances.get(&to).copied().unwrap_or_default(), amount)?;
    erc20.balances.insert(to, credited);
    Ok(())
}

fn erc721_move(state: &mut LedgerState, token: Address, from: Address, to: Address, token_id: U256) -> Result<()> {
    let erc721 = erc721_mut(state, token)?;
    match erc721.owners.get(&token_id) {
        Some(owner) if *owner == from => {
            erc721.owners.insert(token_id, to);
            Ok(())
        }
        _ => Err(Error::insufficient_balance(format!(
            "ERC721: {:?} does not own token {}",
            from, token_id
        ))),
    }
}

fn terminus_move(
    state: &mut LedgerState,
    terminus: Address,
    from: Address,
    to: Address,
    pool_id: U256,
    amount: U256,
) -> Result<()> {
    let terminus_state = terminus_mut(state, terminus)?;
    let available = terminus_state.balances.get(&(pool_id, from)).copied().unwrap_or_default();
    if available < amount {
        return Err(Error::insufficient_balance(format!(
            "ERC1155: insufficient balance for transfer of {} from pool {}",
            amount, pool_id
        )));
    }
    terminus_state.balances.insert((pool_id, from), available - amount);
    let credited = checked_credit(
        terminus_state.balances.get(&(pool_id, to)).copied().unwrap_or_default(),
        amount,
    )?;
    terminus_state.balances.insert((pool_id, to), credited);
    Ok(())
}

fn terminus_mint_as(
    state: &mut LedgerState,
    terminus: Address,
    minter: Address,
    to: Address,
    pool_id: U256,
    amount: U256,
) -> Result<()> {
    let terminus_state = terminus_mut(state, terminus)?;
    let pool = pool_mut(terminus_state, pool_id)?;
    if pool.controller != minter {
        return Err(Error::reverted("TerminusFacet: caller is not the pool controller"));
    }
    let supply = checked_credit(pool.supply, amount)?;
    if supply > pool.capacity {
        return Err(Error::reverted(format!("TerminusFacet: pool {} capacity exceeded", pool_id)));
    }
    pool.supply = supply;

    let balance = checked_credit(
        terminus_state.balances.get(&(pool_id, to)).copied().unwrap_or_default(),
        amount,
    )?;
    terminus_state.balances.insert((pool_id, to), balance);
    Ok(())
}

/// `balance + amount`, reverting on overflow like checked Solidity arithmetic
fn checked_credit(balance: U256, amount: U256) -> Result<U256> {
    balance
        .checked_add(amount)
        .ok_or_else(|| Error::reverted("arithmetic operation overflowed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Address {
        Address::repeat_byte(0xad)
    }

    #[test]
    fn test_deployments_get_distinct_addresses() {
        let ledger = MemoryLedger::default();
        let first = ledger.deploy_dropper(admin()).unwrap();
        let second = ledger.deploy_dropper(admin()).unwrap();
        assert_ne!(first, second);
        assert_eq!(ledger.block_number().unwrap(), 2);
    }

    #[test]
    fn test_failed_transaction_mines_nothing() {
        let ledger = MemoryLedger::default();
        let token = ledger.deploy_erc20(admin()).unwrap();
        let block = ledger.block_number().unwrap();

        let result = ledger.erc20_transfer(admin(), token, Address::repeat_byte(1), U256::one());
        assert!(matches!(result, Err(Error::InsufficientBalance(_))));
        assert_eq!(ledger.block_number().unwrap(), block);
        assert_eq!(ledger.erc20_balance_of(token, Address::repeat_byte(1)).unwrap(), U256::zero());
    }

    #[test]
    fn test_erc721_enumeration_follows_token_order() {
        let ledger = MemoryLedger::default();
        let nft = ledger.deploy_erc721(admin()).unwrap();
        for token_id in [3u64, 1, 2] {
            ledger.erc721_mint(admin(), nft, admin(), U256::from(token_id)).unwrap();
        }

        assert_eq!(ledger.erc721_balance_of(nft, admin()).unwrap(), U256::from(3));
        assert_eq!(ledger.erc721_token_of_owner_by_index(nft, admin(), 0).unwrap(), U256::one());
        assert!(ledger.erc721_mint(admin(), nft, admin(), U256::one()).is_err());
    }

    #[test]
    fn test_terminus_pool_capacity_is_enforced() {
        let ledger = MemoryLedger::default();
        let terminus = ledger.deploy_terminus(admin()).unwrap();
        let (pool_id, _) = ledger.terminus_create_pool(admin(), terminus, U256::from(2)).unwrap();

        ledger.terminus_mint(admin(), terminus, admin(), pool_id, U256::from(2)).unwrap();
        assert!(ledger.terminus_mint(admin(), terminus, admin(), pool_id, U256::one()).is_err());
        assert_eq!(ledger.terminus_pool_supply(terminus, pool_id).unwrap(), U256::from(2));
    }

    #[test]
    fn test_erc20_mint_overflow_reverts() {
        let ledger = MemoryLedger::default();
        let token = ledger.deploy_erc20(admin()).unwrap();
        ledger.erc20_mint(admin(), token, admin(), U256::MAX).unwrap();

        let result = ledger.erc20_mint(admin(), token, Address::repeat_byte(1), U256::one());
        assert!(matches!(result, Err(Error::Reverted(_))));
        assert_eq!(ledger.erc20_balance_of(token, admin()).unwrap(), U256::MAX);
        assert!(ledger.block_number().is_ok());
    }
}
