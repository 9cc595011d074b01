//! Arguments shared by every binding subcommand

use std::path::PathBuf;

use clap::Args;
use dropper_ethereum::TransactionConfig;
use ethers::types::{Address, Bytes, U256};

/// Where to find the contract
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct NetworkArgs {
    /// Name of the configured network to connect to
    #[arg(long)]
    pub network: String,

    /// Address of the deployed contract (defaults to the network's contracts map)
    #[arg(long, value_parser = parse_address)]
    pub address: Option<Address>,
}

/// Who sends the transaction and how it is priced
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TransactArgs {
    #[command(flatten)]
    pub network: NetworkArgs,

    /// Path to keystore file for transaction sender
    #[arg(long)]
    pub sender: PathBuf,

    /// Password to keystore file (if you do not provide it, you will be prompted for it)
    #[arg(long)]
    pub password: Option<String>,

    /// Gas price at which to submit transaction
    #[arg(long, value_parser = parse_u256)]
    pub gas_price: Option<U256>,

    /// Max fee per gas for EIP1559 transactions
    #[arg(long, value_parser = parse_u256)]
    pub max_fee_per_gas: Option<U256>,

    /// Max priority fee per gas for EIP1559 transactions
    #[arg(long, value_parser = parse_u256)]
    pub max_priority_fee_per_gas: Option<U256>,

    /// Number of confirmations to await before considering a transaction completed
    #[arg(long)]
    pub confirmations: Option<usize>,

    /// Nonce for the transaction (optional)
    #[arg(long, value_parser = parse_u256)]
    pub nonce: Option<U256>,

    /// Value of the transaction in wei (optional)
    #[arg(long, value_parser = parse_u256)]
    pub value: Option<U256>,
}

impl TransactArgs {
    /// Transaction overrides, awaiting `default_confirmations` unless given
    pub fn transaction_config(&self, default_confirmations: usize) -> TransactionConfig {
        TransactionConfig {
            gas_price: self.gas_price,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            confirmations: Some(self.confirmations.unwrap_or(default_confirmations)),
            nonce: self.nonce,
            value: self.value,
        }
    }
}

/// Accepts 1/t/y/true/yes and 0/f/n/false/no, in any case
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "t" | "y" | "true" | "yes" => Ok(true),
        "0" | "f" | "n" | "false" | "no" => Ok(false),
        _ => Err(format!(
            "invalid boolean '{}': use one of 1/t/y/true/yes or 0/f/n/false/no",
            raw
        )),
    }
}

/// 0x-prefixed hex bytes
pub fn parse_bytes(raw: &str) -> Result<Bytes, String> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| format!("'{}' must be 0x-prefixed hex", raw))?;
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|e| format!("invalid hex '{}': {}", raw, e))
}

/// Exactly four 0x-prefixed hex bytes, e.g. an ERC-165 interface id
pub fn parse_bytes4(raw: &str) -> Result<[u8; 4], String> {
    let bytes = parse_bytes(raw)?;
    <[u8; 4]>::try_from(bytes.as_ref()).map_err(|_| format!("'{}' is not 4 bytes long", raw))
}

/// Decimal, or 0x-prefixed hex
pub fn parse_u256(raw: &str) -> Result<U256, String> {
    let parsed = match raw.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16).map_err(|e| e.to_string()),
        None => U256::from_dec_str(raw).map_err(|e| e.to_string()),
    };
    parsed.map_err(|e| format!("invalid integer '{}': {}", raw, e))
}

/// 0x-prefixed 20-byte address
pub fn parse_address(raw: &str) -> Result<Address, String> {
    raw.parse::<Address>()
        .map_err(|e| format!("invalid address '{}': {}", raw, e))
}
