//! Token contract ABI and value conversions.

use std::str::FromStr;

use ethers::abi::parse_abi;
use ethers::contract::BaseContract;
use ethers::types::{Address, U256};

use client_blockchain_core::TransportError;

/// Human-readable signatures of the token contract surface.
pub const TOKEN_ABI: &[&str] = &[
    "function owner() external view returns (address)",
    "function totalSupply() external view returns (uint256)",
    "function balanceOf(address account) external view returns (uint256)",
    "function mintPrice() external view returns (uint256)",
    "function mint() external payable",
    "function withdraw() external",
];

pub fn token_contract() -> Result<BaseContract, TransportError> {
    parse_abi(TOKEN_ABI)
        .map(BaseContract::from)
        .map_err(|e| TransportError::Config(format!("token ABI: {e}")))
}

pub fn parse_address(address: &str) -> Result<Address, TransportError> {
    Address::from_str(address)
        .map_err(|e| TransportError::Decode(format!("address {address}: {e}")))
}

/// Lowercase `0x`-prefixed form, as the wallet and explorer links expect.
pub fn format_address(address: &Address) -> String {
    format!("{address:#x}")
}

/// Narrows a `uint256` to `u128`, rejecting values that do not fit.
pub fn to_u128(value: U256) -> Result<u128, TransportError> {
    if value > U256::from(u128::MAX) {
        return Err(TransportError::Decode(format!(
            "uint256 {value} exceeds 128 bits"
        )));
    }
    Ok(value.as_u128())
}
