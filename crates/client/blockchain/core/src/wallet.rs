//! Wallet-adapter capability and connection state.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use token_core::Chain;

use crate::types::TxId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("user rejected")]
    Rejected,

    #[error("wallet is read-only")]
    ReadOnly,

    #[error("wallet has no accounts")]
    NoAccounts,

    #[error("wallet error: {0}")]
    Other(String),
}

/// Chain-encoded transaction for the wallet to sign and broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct SignRequest {
    pub chain: Chain,
    pub payload: serde_json::Value,
}

/// What the core needs from a wallet: accounts, its network, and signing.
#[async_trait]
pub trait Wallet: Send + Sync {
    fn name(&self) -> &str;

    async fn accounts(&self) -> Result<Vec<String>, WalletError>;

    /// Network name the wallet is currently pointed at.
    async fn network(&self) -> Result<String, WalletError>;

    async fn sign_and_submit(&self, request: SignRequest) -> Result<TxId, WalletError>;
}

/// Connection lifecycle, driven by the wallet side.
#[derive(Clone, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected {
        identity: String,
        network: String,
        signer: Arc<dyn Wallet>,
    },
}

impl ConnectionState {
    pub fn identity(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { identity, .. } => Some(identity),
            _ => None,
        }
    }

    pub fn network(&self) -> Option<&str> {
        match self {
            ConnectionState::Connected { network, .. } => Some(network),
            _ => None,
        }
    }

    pub fn signer(&self) -> Option<Arc<dyn Wallet>> {
        match self {
            ConnectionState::Connected { signer, .. } => Some(Arc::clone(signer)),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected { .. })
    }
}

impl fmt::Debug for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("Disconnected"),
            ConnectionState::Connecting => f.write_str("Connecting"),
            ConnectionState::Connected {
                identity,
                network,
                signer,
            } => f
                .debug_struct("Connected")
                .field("identity", identity)
                .field("network", network)
                .field("signer", &signer.name())
                .finish(),
        }
    }
}

/// Wallet that knows an identity but cannot sign.
///
/// Lets a session display balances and ownership on chains without a signing
/// backend; every submission fails with [`WalletError::ReadOnly`].
#[derive(Debug, Clone)]
pub struct ReadOnlyWallet {
    identity: String,
    network: String,
}

impl ReadOnlyWallet {
    pub fn new(identity: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            network: network.into(),
        }
    }
}

#[async_trait]
impl Wallet for ReadOnlyWallet {
    fn name(&self) -> &str {
        "read-only"
    }

    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        Ok(vec![self.identity.clone()])
    }

    async fn network(&self) -> Result<String, WalletError> {
        Ok(self.network.clone())
    }

    async fn sign_and_submit(&self, _request: SignRequest) -> Result<TxId, WalletError> {
        Err(WalletError::ReadOnly)
    }
}
