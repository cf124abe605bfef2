//! Static per-deployment contract configuration.

use serde::{Deserialize, Serialize};

use crate::identity::AddressFormat;
use crate::units::{Amount, MAX_DECIMALS};

/// Chains the token has been deployed to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Chain {
    Aptos,
    Avalanche,
    Ethereum,
    Injective,
    Near,
    Polkadot,
    Solana,
    Sui,
}

impl Chain {
    /// How account identities are spelled on this chain.
    pub fn address_format(&self) -> AddressFormat {
        match self {
            Chain::Avalanche | Chain::Ethereum => AddressFormat::Hex { width: 20 },
            Chain::Aptos | Chain::Sui => AddressFormat::Hex { width: 32 },
            Chain::Polkadot => AddressFormat::Ss58,
            Chain::Solana => AddressFormat::Base58 { width: 32 },
            Chain::Injective | Chain::Near => AddressFormat::AccountId,
        }
    }

    pub fn is_evm(&self) -> bool {
        matches!(self, Chain::Avalanche | Chain::Ethereum)
    }

    /// Ticker of the chain's native currency.
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Aptos => "APT",
            Chain::Avalanche => "AVAX",
            Chain::Ethereum => "ETH",
            Chain::Injective => "INJ",
            Chain::Near => "NEAR",
            Chain::Polkadot => "SBY",
            Chain::Solana => "SOL",
            Chain::Sui => "SUI",
        }
    }
}

/// Everything needed to talk to one deployed token contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub chain: Chain,
    /// Network name the deployment lives on (e.g. `sepolia`, `testnet`).
    pub network: String,
    pub rpc_url: String,
    /// Contract address, package id or program id.
    pub contract_id: String,
    /// Move module name, when the chain addresses code by module.
    pub module: Option<String>,
    /// Shared object holding contract state (the Sui treasury).
    pub state_object: Option<String>,
    pub symbol: String,
    pub token_decimals: u8,
    pub native_decimals: u8,
    /// Native base units paid per mint.
    pub mint_price: u128,
    /// Token base units received per mint.
    pub mint_amount: u128,
    /// Transaction explorer prefix; the transaction id is appended.
    pub explorer_url: Option<String>,
}

impl ContractConfig {
    pub fn address_format(&self) -> AddressFormat {
        self.chain.address_format()
    }

    pub fn mint_price_amount(&self) -> Amount {
        Amount::from_base(self.mint_price, self.native_decimals)
    }

    pub fn mint_amount_tokens(&self) -> Amount {
        Amount::from_base(self.mint_amount, self.token_decimals)
    }

    /// Explorer link for a transaction, if an explorer is configured.
    pub fn explorer_link(&self, tx_id: &str) -> Option<String> {
        self.explorer_url
            .as_deref()
            .map(|base| format!("{}/{tx_id}", base.trim_end_matches('/')))
    }

    /// Checks the invariants that do not depend on the endpoint format.
    pub fn check_amounts(&self) -> Result<(), String> {
        if self.contract_id.trim().is_empty() {
            return Err("contract id must not be empty".to_string());
        }
        if self.token_decimals > MAX_DECIMALS || self.native_decimals > MAX_DECIMALS {
            return Err(format!("decimals must not exceed {MAX_DECIMALS}"));
        }
        if self.mint_price == 0 {
            return Err("mint price must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sepolia() -> ContractConfig {
        ContractConfig {
            chain: Chain::Ethereum,
            network: "sepolia".into(),
            rpc_url: "https://rpc.sepolia.org".into(),
            contract_id: "0x0000000000000000000000000000000000000001".into(),
            module: None,
            state_object: None,
            symbol: "IABS".into(),
            token_decimals: 18,
            native_decimals: 18,
            mint_price: 10u128.pow(16),
            mint_amount: 1000 * 10u128.pow(18),
            explorer_url: Some("https://sepolia.etherscan.io/tx/".into()),
        }
    }

    #[test]
    fn chain_parses_case_insensitively() {
        assert_eq!("Ethereum".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!("SUI".parse::<Chain>().unwrap(), Chain::Sui);
        assert!("bitcoin".parse::<Chain>().is_err());
    }

    #[test]
    fn amounts_use_their_own_scale() {
        let config = sepolia();
        assert_eq!(config.mint_price_amount().to_string(), "0.01");
        assert_eq!(config.mint_amount_tokens().to_string(), "1,000");
    }

    #[test]
    fn explorer_link_joins_without_double_slash() {
        assert_eq!(
            sepolia().explorer_link("0xabc").as_deref(),
            Some("https://sepolia.etherscan.io/tx/0xabc")
        );
    }

    #[test]
    fn zero_price_is_rejected() {
        let mut config = sepolia();
        config.mint_price = 0;
        assert!(config.check_amounts().is_err());
        config.mint_price = 1;
        config.native_decimals = 39;
        assert!(config.check_amounts().is_err());
    }
}
