//! Display snapshot of the contract's on-chain state.

use serde::{Deserialize, Serialize};

use crate::units::Amount;

/// Result of one fetch cycle. Replaced wholesale, never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadSnapshot {
    pub owner: Option<String>,
    pub total_supply: Amount,
    /// Native currency held by the contract (accumulated mint payments).
    pub contract_balance: Amount,
    pub caller_balance: Amount,
    /// Only populated when the contract exposes a price view.
    pub mint_price: Option<Amount>,
    /// Logical version; `0` means nothing has been fetched yet.
    pub version: u64,
}

impl ReadSnapshot {
    /// Zero-sentinel snapshot used before the first fetch completes.
    pub fn empty(token_decimals: u8, native_decimals: u8) -> Self {
        Self {
            owner: None,
            total_supply: Amount::zero(token_decimals),
            contract_balance: Amount::zero(native_decimals),
            caller_balance: Amount::zero(token_decimals),
            mint_price: None,
            version: 0,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.version == 0
    }
}

/// One of the independent reads that make up a snapshot.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum ReadField {
    Owner,
    TotalSupply,
    ContractBalance,
    CallerBalance,
    MintPrice,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_uses_zero_sentinels() {
        let snapshot = ReadSnapshot::empty(8, 8);
        assert!(snapshot.is_initial());
        assert!(snapshot.owner.is_none());
        assert!(snapshot.total_supply.is_zero());
        assert_eq!(snapshot.contract_balance.decimals(), 8);
    }

    #[test]
    fn field_names_are_snake_case() {
        assert_eq!(ReadField::TotalSupply.to_string(), "total_supply");
        assert_eq!(ReadField::CallerBalance.to_string(), "caller_balance");
    }
}
