//! Built-in deployment presets, one per chain the token was released on.

use client_blockchain_core::{InterfaceDescriptor, MethodNames, NATIVE_BALANCE};
use token_core::{Chain, ContractConfig};

/// Contract id used where no deployment address was published.
pub const CONTRACT_PLACEHOLDER: &str = "IABS_CONTRACT_PLACEHOLDER";

const SYMBOL: &str = "IABS";
const TOKENS_PER_MINT: u128 = 1000;

/// A deployment record plus the method names it answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub contract: ContractConfig,
    pub interface: InterfaceDescriptor,
}

struct Deployment {
    network: &'static str,
    rpc_url: &'static str,
    contract_id: &'static str,
    module: Option<&'static str>,
    state_object: Option<&'static str>,
    token_decimals: u8,
    native_decimals: u8,
    mint_price: u128,
    explorer_url: Option<&'static str>,
}

pub fn preset(chain: Chain) -> Preset {
    let deployment = deployment(chain);
    let contract = ContractConfig {
        chain,
        network: deployment.network.to_string(),
        rpc_url: deployment.rpc_url.to_string(),
        contract_id: deployment.contract_id.to_string(),
        module: deployment.module.map(str::to_string),
        state_object: deployment.state_object.map(str::to_string),
        symbol: SYMBOL.to_string(),
        token_decimals: deployment.token_decimals,
        native_decimals: deployment.native_decimals,
        mint_price: deployment.mint_price,
        mint_amount: TOKENS_PER_MINT * 10u128.pow(u32::from(deployment.token_decimals)),
        explorer_url: deployment.explorer_url.map(str::to_string),
    };
    let interface = InterfaceDescriptor {
        chain,
        module: contract.module.clone(),
        state_object: contract.state_object.clone(),
        methods: methods(chain),
    };
    Preset {
        contract,
        interface,
    }
}

fn deployment(chain: Chain) -> Deployment {
    match chain {
        Chain::Aptos => Deployment {
            network: "testnet",
            rpc_url: "https://fullnode.testnet.aptoslabs.com/v1",
            contract_id: "0x66da5deaafe9b7bc30c67c3fe3044c7d1af12a5477fa2cfb830f370232ceb9ea",
            module: Some("IABS"),
            state_object: None,
            token_decimals: 8,
            native_decimals: 8,
            mint_price: 1_000_000,
            explorer_url: Some("https://explorer.aptoslabs.com/txn"),
        },
        Chain::Avalanche => Deployment {
            network: "fuji",
            rpc_url: "https://api.avax-test.network/ext/bc/C/rpc",
            contract_id: "0xFFbC7A0F639a89bA6914a8D356769853C41AD52B",
            module: None,
            state_object: None,
            token_decimals: 18,
            native_decimals: 18,
            mint_price: 10u128.pow(16),
            explorer_url: Some("https://testnet.snowtrace.io/tx"),
        },
        Chain::Ethereum => Deployment {
            network: "sepolia",
            rpc_url: "https://rpc.sepolia.org",
            contract_id: CONTRACT_PLACEHOLDER,
            module: None,
            state_object: None,
            token_decimals: 18,
            native_decimals: 18,
            mint_price: 10u128.pow(16),
            explorer_url: Some("https://sepolia.etherscan.io/tx"),
        },
        Chain::Injective => Deployment {
            network: "testnet",
            rpc_url: "https://testnet.sentry.tm.injective.network:443",
            contract_id: CONTRACT_PLACEHOLDER,
            module: None,
            state_object: None,
            token_decimals: 6,
            native_decimals: 18,
            mint_price: 10_000_000,
            explorer_url: Some("https://testnet.explorer.injective.network/transaction"),
        },
        Chain::Near => Deployment {
            network: "testnet",
            rpc_url: "https://rpc.testnet.near.org",
            contract_id: CONTRACT_PLACEHOLDER,
            module: None,
            state_object: None,
            token_decimals: 24,
            native_decimals: 24,
            mint_price: 10u128.pow(22),
            explorer_url: Some("https://testnet.nearblocks.io/txns"),
        },
        Chain::Polkadot => Deployment {
            network: "shibuya",
            rpc_url: "wss://rpc.shibuya.astar.network",
            contract_id: "5DiM11EBXcTmA9D6Zt2UA7bEcX4et2vVLLGrz3eWSSjFXiKS",
            module: None,
            state_object: None,
            token_decimals: 18,
            native_decimals: 18,
            mint_price: 10u128.pow(16),
            explorer_url: Some("https://shibuya.subscan.io/extrinsic"),
        },
        Chain::Solana => Deployment {
            network: "devnet",
            rpc_url: "https://api.devnet.solana.com",
            contract_id: "Eu8NveMwqqQK8WEUBDSqht6WaoJeZHLYVnWcNHLnU5ks",
            module: None,
            state_object: None,
            token_decimals: 9,
            native_decimals: 9,
            mint_price: 10_000_000,
            explorer_url: Some("https://explorer.solana.com/tx"),
        },
        Chain::Sui => Deployment {
            network: "testnet",
            rpc_url: "https://fullnode.testnet.sui.io:443",
            contract_id: "0xd59547b76ee1e7db553762903494f7a45d898dc583609ee1369cb8f0845f4e47",
            module: Some("iabs"),
            state_object: Some(
                "0x26fd5926f73ba3b52a1264ae11ea10d46bc86319d2d3d02aa80aaadbde59e419",
            ),
            token_decimals: 0,
            native_decimals: 9,
            mint_price: 10_000_000,
            explorer_url: Some("https://suiscan.xyz/testnet/tx"),
        },
    }
}

fn methods(chain: Chain) -> MethodNames {
    let names = |owner: &str,
                 total_supply: &str,
                 contract_balance: &str,
                 balance_of: &str,
                 mint_price: Option<&str>| MethodNames {
        mint: "mint".to_string(),
        withdraw: "withdraw".to_string(),
        owner: owner.to_string(),
        total_supply: total_supply.to_string(),
        contract_balance: contract_balance.to_string(),
        balance_of: balance_of.to_string(),
        mint_price: mint_price.map(str::to_string),
    };

    match chain {
        Chain::Avalanche | Chain::Ethereum => {
            names("owner", "totalSupply", NATIVE_BALANCE, "balanceOf", None)
        }
        Chain::Aptos => names(
            "get_owner",
            "get_total_supply",
            "get_contract_balance",
            "balance_of",
            None,
        ),
        Chain::Sui => names("owner", "total_supply", "balance", "IABSBalance", None),
        Chain::Polkadot => names(
            "owner",
            "total_supply",
            "contract_balance",
            "balance_of",
            Some("min_payment"),
        ),
        Chain::Injective => names(
            "owner",
            "get_total_supply",
            "get_collected_funds",
            "get_balance",
            None,
        ),
        Chain::Near => names(
            "get_owner",
            "ft_total_supply",
            NATIVE_BALANCE,
            "ft_balance_of",
            None,
        ),
        Chain::Solana => names("owner", "total_supply", NATIVE_BALANCE, "balance_of", None),
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_preset_passes_amount_checks() {
        for chain in Chain::iter() {
            let preset = preset(chain);
            assert!(preset.contract.check_amounts().is_ok(), "{chain}");
            assert_eq!(preset.interface.chain, chain);
            assert_eq!(
                preset.contract.mint_amount_tokens().to_string(),
                "1,000",
                "{chain}"
            );
        }
    }

    #[test]
    fn deployed_constants() {
        let aptos = preset(Chain::Aptos);
        assert_eq!(aptos.contract.mint_price_amount().to_string(), "0.01");
        assert_eq!(aptos.interface.module.as_deref(), Some("IABS"));
        assert_eq!(aptos.interface.methods.owner, "get_owner");

        let sui = preset(Chain::Sui);
        assert_eq!(sui.contract.mint_amount, 1000);
        assert!(sui.interface.state_object.is_some());

        let fuji = preset(Chain::Avalanche);
        assert_eq!(fuji.contract.network, "fuji");
        assert_eq!(fuji.interface.methods.contract_balance, NATIVE_BALANCE);
    }
}
