//! Common types for contract interactions.

use std::fmt;

use serde::{Deserialize, Serialize};
use token_core::{Chain, TxKind};

use crate::traits::TransportError;

/// Pseudo-method naming the contract's native currency balance.
///
/// EVM contracts hold mint payments as plain ether, so there is no view to
/// call; adapters answer this name with a balance query on the contract address.
pub const NATIVE_BALANCE: &str = "@native_balance";

/// Network name plus the endpoint serving it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkEndpoint {
    pub network: String,
    pub url: String,
}

/// Contract address, package id or program id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract method names for the logical operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodNames {
    pub mint: String,
    pub withdraw: String,
    pub owner: String,
    pub total_supply: String,
    pub contract_balance: String,
    pub balance_of: String,
    /// Optional price view; absent on most deployments.
    pub mint_price: Option<String>,
}

impl MethodNames {
    pub fn for_kind(&self, kind: TxKind) -> &str {
        match kind {
            TxKind::Mint => &self.mint,
            TxKind::Withdraw => &self.withdraw,
        }
    }
}

/// ABI/IDL stand-in: which chain family to encode for and what to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDescriptor {
    pub chain: Chain,
    /// Move module the functions live in.
    pub module: Option<String>,
    /// Shared object holding contract state (Sui treasury).
    pub state_object: Option<String>,
    pub methods: MethodNames,
}

/// Resolved reference to a deployed contract.
///
/// Built by the resolver for one (endpoint, contract, identity) triple and
/// discarded, never mutated, when any of them changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractHandle {
    pub endpoint: NetworkEndpoint,
    pub contract: ContractId,
    pub interface: InterfaceDescriptor,
    /// Identity the handle was resolved for.
    pub identity: String,
    /// Bumped on every rebuild so stale handles can be told apart.
    pub generation: u64,
}

impl ContractHandle {
    pub fn methods(&self) -> &MethodNames {
        &self.interface.methods
    }

    pub fn chain(&self) -> Chain {
        self.interface.chain
    }
}

/// Argument passed to a read-only view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Identity(String),
    Amount(u128),
}

/// Decoded result of a read-only view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadValue {
    Identity(String),
    Integer(u128),
}

impl ReadValue {
    pub fn into_integer(self) -> Result<u128, TransportError> {
        match self {
            ReadValue::Integer(value) => Ok(value),
            ReadValue::Identity(id) => Err(TransportError::Decode(format!(
                "expected an integer, got identity {id}"
            ))),
        }
    }

    pub fn into_identity(self) -> Result<String, TransportError> {
        match self {
            ReadValue::Identity(id) => Ok(id),
            ReadValue::Integer(value) => Err(TransportError::Decode(format!(
                "expected an identity, got integer {value}"
            ))),
        }
    }
}

/// A state-changing call, independent of any chain's encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub kind: TxKind,
    pub method: String,
    /// Native base units paid with the call.
    pub payment: u128,
    /// Withdraw amount for contracts that take one; others ignore it.
    pub amount: Option<u128>,
}

/// Transaction hash or digest as reported by the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A submitted transaction whose outcome is not yet known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTx {
    pub id: TxId,
    pub kind: TxKind,
}

/// Status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalityStatus {
    /// Known to the node but not yet included.
    Pending,
    /// Included in a block; not terminal.
    InBlock,
    /// Irreversible and successful.
    Finalized { emitted_events: usize },
    /// Irreversible and rejected by the chain.
    Failed(DispatchError),
}

impl FinalityStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FinalityStatus::Finalized { .. } | FinalityStatus::Failed(_)
        )
    }
}

/// Chain-side failure reason, decoded where the chain exposes structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchError {
    /// Substrate-style module error.
    Module {
        section: String,
        name: String,
        docs: String,
    },
    /// EVM revert or Move abort with its reason text.
    Reverted(String),
    Other(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Module {
                section,
                name,
                docs,
            } => write!(f, "{section}.{name}: {docs}"),
            DispatchError::Reverted(reason) | DispatchError::Other(reason) => f.write_str(reason),
        }
    }
}
