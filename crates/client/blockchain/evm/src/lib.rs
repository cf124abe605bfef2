//! EVM chain integration (Ethereum Sepolia, Avalanche Fuji).
//!
//! Built on `ethers`: a `Provider<Http>` probes with `eth_getCode`, views go
//! through a `Contract` bound to the token ABI, balances through
//! `eth_getBalance`, and finality polls transaction receipts. Submission hands
//! a `TransactionRequest` to an [`RpcWallet`] (any node or signer exposing
//! `eth_sendTransaction`).

pub mod abi;
pub mod transport;
pub mod wallet;

pub use transport::EvmTransport;
pub use wallet::{RpcWallet, network_name};
