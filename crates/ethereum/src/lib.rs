/// Chain backend for the Dropper claim workflow
///
/// Typed `abigen!` bindings for the Dropper contract and the mock tokens it
/// is tested with, plus client wrappers that turn contract calls into
/// `dropper_common::Result`s and confirmed transactions into `TxReceipt`s.
pub mod artifacts;
pub mod bindings;
pub mod dropper;
pub mod errors;
pub mod provider;
pub mod tokens;
pub mod transaction;
pub mod wallet;

use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;

pub use artifacts::ContractArtifact;
pub use dropper::DropperClient;
pub use errors::{contract_error, revert_reason};
pub use provider::{EthereumProvider, EthereumProviderConfig};
pub use tokens::{Erc20Client, Erc721Client, TerminusClient};
pub use transaction::TransactionConfig;
pub use wallet::load_keystore;

/// Middleware used for every transacting client: an HTTP provider with a local signer
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;
