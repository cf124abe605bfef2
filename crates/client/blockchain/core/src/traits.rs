//! Chain capability interface.
//!
//! Every adapter implements [`ChainTransport`]; nothing above this layer knows
//! how a particular chain encodes calls or reports finality.

use async_trait::async_trait;

use crate::finality::Finality;
use crate::types::{CallArg, ContractCall, ContractHandle, PendingTx, ReadValue};
use crate::wallet::{Wallet, WalletError};

// ============================================================================
// Error Types
// ============================================================================

/// Transport layer errors.
///
/// `Rejected`, `Reverted` and `Finality` display their message verbatim so the
/// chain's own wording reaches the user unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("contract not deployed: {0}")]
    NotDeployed(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("read of {method} failed: {reason}")]
    ReadFailed { method: String, reason: String },

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Reverted(String),

    #[error("{0}")]
    Finality(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<WalletError> for TransportError {
    fn from(err: WalletError) -> Self {
        TransportError::Rejected(err.to_string())
    }
}

// ============================================================================
// Capability Interface
// ============================================================================

/// Narrow per-chain capability used by the resolver, fetcher and controller.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Adapter name for logs (e.g. "evm", "sui").
    fn name(&self) -> &str;

    /// Inexpensive read-only check that the contract exists at the endpoint.
    async fn probe(&self, handle: &ContractHandle) -> Result<(), TransportError>;

    /// Call a read-only view.
    async fn read(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[CallArg],
    ) -> Result<ReadValue, TransportError>;

    /// Encode `call`, have `wallet` sign and broadcast it, and return the pending reference.
    async fn submit(
        &self,
        handle: &ContractHandle,
        call: &ContractCall,
        wallet: &dyn Wallet,
    ) -> Result<PendingTx, TransportError>;

    /// Start observing finality for a submitted transaction.
    async fn finality(
        &self,
        handle: &ContractHandle,
        pending: &PendingTx,
    ) -> Result<Finality, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_rejection_keeps_message() {
        let err: TransportError = WalletError::Rejected.into();
        assert_eq!(err.to_string(), "user rejected");
    }
}
