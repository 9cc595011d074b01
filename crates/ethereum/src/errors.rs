//! Mapping contract failures onto `dropper_common::Error`

use dropper_common::Error;
use ethers::abi::{self, ParamType, Token};
use ethers::contract::ContractError;
use ethers::providers::Middleware;

/// Selector of Solidity's `Error(string)`
const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Decode the reason string of an `Error(string)` revert payload
pub fn revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 || data[..4] != ERROR_STRING_SELECTOR {
        return None;
    }
    match abi::decode(&[ParamType::String], &data[4..]).ok()?.pop()? {
        Token::String(reason) => Some(reason),
        _ => None,
    }
}

/// Classify a revert reason raised by `operation`
pub fn classify_revert(operation: &str, reason: &str) -> Error {
    let lowered = reason.to_lowercase();
    let message = format!("{} reverted: {}", operation, reason);

    if lowered.contains("ownable")
        || lowered.contains("not the owner")
        || lowered.contains("invalid signer")
        || lowered.contains("unauthorized")
    {
        Error::authorization(message)
    } else if lowered.contains("exceeds balance")
        || lowered.contains("insufficient")
        || lowered.contains("incorrect owner")
        || lowered.contains("not owner nor approved")
    {
        Error::insufficient_balance(message)
    } else if lowered.contains("nonexistent") || lowered.contains("does not exist") {
        Error::not_found(message)
    } else if lowered.contains("deadline")
        || lowered.contains("not active")
        || lowered.contains("already claimed")
    {
        Error::validation(message)
    } else {
        Error::reverted(message)
    }
}

/// Convert an ethers contract error into the workflow error taxonomy
pub fn contract_error<M: Middleware>(operation: &str, err: ContractError<M>) -> Error {
    if let Some(data) = err.as_revert() {
        return match revert_reason(data) {
            Some(reason) => classify_revert(operation, &reason),
            None => Error::reverted(format!("{} reverted with data 0x{}", operation, hex::encode(data))),
        };
    }

    // Nodes often report reverts from gas estimation as plain RPC error text
    let message = err.to_string();
    if message.contains("revert") {
        return classify_revert(operation, &message);
    }
    Error::chain(format!("{} failed: {}", operation, message))
}
