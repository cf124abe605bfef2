//! Chain abstraction layer for the IABS token client.
//!
//! # Architecture
//!
//! ```text
//! runtime (resolver, fetcher, controller)
//!          │
//!          ▼
//! ChainTransport ── probe / read / submit / finality
//!          │
//!          ├── client-blockchain-evm    (ethers provider)
//!          ├── client-blockchain-sui    (sui-sdk)
//!          └── client-blockchain-aptos  (REST)
//!
//! Wallet ── accounts / network / sign_and_submit
//! ```
//!
//! Adapters own all chain encoding. The runtime only ever sees
//! [`ContractHandle`], [`ContractCall`], [`ReadValue`] and [`Finality`].
//!
//! The `mock` feature exposes [`MockChain`] and [`MockWallet`] for tests in
//! dependent crates.

pub mod finality;
pub mod traits;
pub mod types;
pub mod wallet;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use finality::{Finality, FinalityFuture, Subscription, poll_finality};
pub use traits::{ChainTransport, TransportError};
pub use types::{
    CallArg, ContractCall, ContractHandle, ContractId, DispatchError, FinalityStatus,
    InterfaceDescriptor, MethodNames, NATIVE_BALANCE, NetworkEndpoint, PendingTx, ReadValue, TxId,
};
pub use wallet::{ConnectionState, ReadOnlyWallet, SignRequest, Wallet, WalletError};

#[cfg(any(test, feature = "mock"))]
pub use mock::{FinalityMode, MOCK_NETWORK, MockChain, MockWallet};
