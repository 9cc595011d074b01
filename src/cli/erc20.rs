//! `dropper mock-erc20 ...`
use anyhow::{anyhow, Result};
use clap::Subcommand;
use dropper_ethereum::tokens::ERC20_ARTIFACT;
use dropper_ethereum::Erc20Client;
use dropper_tools::DropperConfig;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use serde_json::{json, Value};
use tracing::info;

use super::args::{parse_address, parse_u256, NetworkArgs, TransactArgs};
use super::{address, artifact, contract_address, provider_for, signer_for, to_json, uint};

#[derive(Subcommand, Debug)]
pub enum Erc20Command {
    /// Deploy a new MockErc20
    Deploy {
        #[command(flatten)]
        tx: TransactArgs,
    },

    Name {
        #[command(flatten)]
        target: NetworkArgs,
    },

    Symbol {
        #[command(flatten)]
        target: NetworkArgs,
    },

    Decimals {
        #[command(flatten)]
        target: NetworkArgs,
    },

    TotalSupply {
        #[command(flatten)]
        target: NetworkArgs,
    },

    BalanceOf {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_address)]
        account: Address,
    },

    Allowance {
        #[command(flatten)]
        target: NetworkArgs,

        #[arg(long, value_parser = parse_address)]
        owner: Address,

        #[arg(long, value_parser = parse_address)]
        spender: Address,
    },

    Approve {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        spender: Address,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },

    Transfer {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },

    TransferFrom {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        from: Address,

        #[arg(long, value_parser = parse_address)]
        to: Address,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },

    IncreaseAllowance {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        spender: Address,

        #[arg(long, value_parser = parse_u256)]
        added_value: U256,
    },

    DecreaseAllowance {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        spender: Address,

        #[arg(long, value_parser = parse_u256)]
        subtracted_value: U256,
    },

    /// Mint tokens to an account
    Mint {
        #[command(flatten)]
        tx: TransactArgs,

        #[arg(long, value_parser = parse_address)]
        account: Address,

        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },
}

impl Erc20Command {
    fn target(&self) -> &NetworkArgs {
        match self {
            Erc20Command::Name { target }
            | Erc20Command::Symbol { target }
            | Erc20Command::Decimals { target }
            | Erc20Command::TotalSupply { target }
            | Erc20Command::BalanceOf { target, .. }
            | Erc20Command::Allowance { target, .. } => target,
            Erc20Command::Deploy { tx }
            | Erc20Command::Approve { tx, .. }
            | Erc20Command::Transfer { tx, .. }
            | Erc20Command::TransferFrom { tx, .. }
            | Erc20Command::IncreaseAllowance { tx, .. }
            | Erc20Command::DecreaseAllowance { tx, .. }
            | Erc20Command::Mint { tx, .. } => &tx.network,
        }
    }

    fn transact_args(&self) -> Option<&TransactArgs> {
        match self {
            Erc20Command::Deploy { tx }
            | Erc20Command::Approve { tx, .. }
            | Erc20Command::Transfer { tx, .. }
            | Erc20Command::TransferFrom { tx, .. }
            | Erc20Command::IncreaseAllowance { tx, .. }
            | Erc20Command::DecreaseAllowance { tx, .. }
            | Erc20Command::Mint { tx, .. } => Some(tx),
            _ => None,
        }
    }
}

pub async fn run(config: &DropperConfig, command: Erc20Command) -> Result<Value> {
    let token = contract_address(config, command.target(), ERC20_ARTIFACT)?;

    match command.transact_args().cloned() {
        Some(tx) => {
            let (client, tx_config) = signer_for(config, &tx).await?;
            let mut erc20 = Erc20Client::new(client, token).with_transaction_config(tx_config);
            if let Erc20Command::Deploy { .. } = command {
                let deployed = erc20.deploy(&artifact(config, ERC20_ARTIFACT)?).await?;
                info!(address = ?deployed, network = %tx.network.network, "Deployed MockErc20");
                return Ok(json!({ "address": address(deployed) }));
            }
            execute(&erc20, command).await
        }
        None => {
            let provider = provider_for(config, &command.target().network)?;
            execute(&Erc20Client::new(provider.provider(), token), command).await
        }
    }
}

/// Run one token call through `erc20`
pub async fn execute<M: Middleware + 'static>(erc20: &Erc20Client<M>, command: Erc20Command) -> Result<Value> {
    let value = match command {
        Erc20Command::Name { .. } => json!(erc20.name().await?),
        Erc20Command::Symbol { .. } => json!(erc20.symbol().await?),
        Erc20Command::Decimals { .. } => json!(erc20.decimals().await?),
        Erc20Command::TotalSupply { .. } => uint(erc20.total_supply().await?),
        Erc20Command::BalanceOf { account, .. } => uint(erc20.balance_of(account).await?),
        Erc20Command::Allowance { owner, spender, .. } => uint(erc20.allowance(owner, spender).await?),
        Erc20Command::Approve { spender, amount, .. } => to_json(&erc20.approve(spender, amount).await?)?,
        Erc20Command::Transfer { to, amount, .. } => to_json(&erc20.transfer(to, amount).await?)?,
        Erc20Command::TransferFrom { from, to, amount, .. } => {
            to_json(&erc20.transfer_from(from, to, amount).await?)?
        }
        Erc20Command::IncreaseAllowance { spender, added_value, .. } => {
            to_json(&erc20.increase_allowance(spender, added_value).await?)?
        }
        Erc20Command::DecreaseAllowance { spender, subtracted_value, .. } => {
            to_json(&erc20.decrease_allowance(spender, subtracted_value).await?)?
        }
        Erc20Command::Mint { account, amount, .. } => to_json(&erc20.mint(account, amount).await?)?,
        Erc20Command::Deploy { .. } => return Err(anyhow!("deploy is not a token call")),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use clap::Parser;
    use dropper_common::Error;
    use ethers::abi::{self, Token};
    use ethers::providers::Provider;
    use ethers::types::Bytes;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: Erc20Command,
    }

    fn target() -> NetworkArgs {
        NetworkArgs {
            network: "development".to_string(),
            address: None,
        }
    }

    #[test]
    fn test_parse_transfer_from() {
        let cli = TestCli::try_parse_from([
            "mock-erc20", "transfer-from",
            "--network", "development",
            "--address", "0x00000000000000000000000000000000000000e2",
            "--sender", "owner.json",
            "--password", "secret",
            "--from", "0x0000000000000000000000000000000000000001",
            "--to", "0x0000000000000000000000000000000000000002",
            "--amount", "0x10",
            "--gas-price", "1000000000",
        ])
        .unwrap();

        match cli.command {
            Erc20Command::TransferFrom { tx, from, to, amount } => {
                assert_eq!(tx.network.address, Some(Address::from_low_u64_be(0xe2)));
                assert_eq!(tx.password.as_deref(), Some("secret"));
                assert_eq!(tx.gas_price, Some(U256::exp10(9)));
                assert_eq!(from, Address::from_low_u64_be(1));
                assert_eq!(to, Address::from_low_u64_be(2));
                assert_eq!(amount, U256::from(16));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_requires_sender_for_writes() {
        let result = TestCli::try_parse_from([
            "mock-erc20", "mint", "--network", "development",
            "--account", "0x0000000000000000000000000000000000000001", "--amount", "1",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_execute_balance_of() {
        let (provider, mock) = Provider::mocked();
        mock.push::<Bytes, _>(Bytes::from(abi::encode(&[Token::Uint(U256::exp10(18))]))).unwrap();

        let erc20 = Erc20Client::new(Arc::new(provider), Some(Address::repeat_byte(0xe2)));
        let value = execute(&erc20, Erc20Command::BalanceOf { target: target(), account: Address::repeat_byte(1) })
            .await
            .unwrap();
        assert_eq!(value, json!("1000000000000000000"));
    }

    #[tokio::test]
    async fn test_execute_without_address() {
        let (provider, _mock) = Provider::mocked();
        let erc20 = Erc20Client::new(Arc::new(provider), None);

        let err = execute(&erc20, Erc20Command::TotalSupply { target: target() }).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotInstantiated(_))));
    }
}
