//! Aptos integration for the IABS token over the node REST API.
//!
//! Reads go through `POST /view`, the probe checks the published module with
//! `GET /accounts/{address}/module/{name}`, and finality polls
//! `GET /transactions/by_hash/{hash}`.

pub mod rest;
pub mod transport;

pub use transport::AptosTransport;
