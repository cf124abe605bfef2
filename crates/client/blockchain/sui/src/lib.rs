//! Sui blockchain integration for the IABS token.
//!
//! # Architecture
//!
//! ```text
//! runtime ──ChainTransport──▶ SuiTransport ──sui-sdk read_api──▶ Sui fullnode
//!                                  │
//!                                  ├── get_object_with_options        (treasury fields, probe)
//!                                  ├── get_owned_objects              (holder balance)
//!                                  └── get_transaction_with_options   (finality)
//! ```
//!
//! The `SuiClient` is built on first use, so assembling a session never
//! touches the network.
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_sui::{SuiConfig, SuiNetwork, SuiTransport};
//!
//! let transport = SuiTransport::new(SuiConfig::new(SuiNetwork::Testnet))?;
//! ```

pub mod client;
pub mod config;
pub mod utils;

pub use client::SuiTransport;
pub use config::{SuiConfig, SuiConfigError, SuiNetwork};
