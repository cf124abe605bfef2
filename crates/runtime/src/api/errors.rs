//! Unified error types surfaced by the runtime API.
//!
//! None of these are fatal to the process: each one ends the current request
//! and leaves the session in an actionable state.
use thiserror::Error;

use client_blockchain_core::WalletError;
use token_core::TxKind;

pub type Result<T> = std::result::Result<T, SessionError>;

/// Why a contract handle could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("contract not deployed: {0}")]
    NotDeployed(String),

    #[error("wallet is on {actual}, contract is deployed on {expected}")]
    NetworkMismatch { expected: String, actual: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("wallet not connected")]
    NotConnected,

    #[error("contract unavailable: {0}")]
    HandleUnavailable(String),

    #[error("wallet is on {actual}, contract is deployed on {expected}")]
    NetworkMismatch { expected: String, actual: String },

    #[error("{0} is not available to this account")]
    ActionUnavailable(TxKind),

    #[error("a {0} is already in progress")]
    AttemptInFlight(TxKind),

    #[error("withdraw amount must use {expected} decimals, got {actual}")]
    AmountScale { expected: u8, actual: u8 },

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("session requires {0} to be configured before building")]
    MissingComponent(&'static str),

    #[error("invalid contract configuration: {0}")]
    InvalidConfig(String),
}

impl From<ResolveError> for SessionError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NotConnected => SessionError::NotConnected,
            ResolveError::NotDeployed(reason) => SessionError::HandleUnavailable(reason),
            ResolveError::NetworkMismatch { expected, actual } => {
                SessionError::NetworkMismatch { expected, actual }
            }
        }
    }
}
