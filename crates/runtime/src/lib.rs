//! Session runtime for the IABS token client.
//!
//! This crate turns a chain adapter and a wallet into a consistent view of one
//! deployed token contract and a safe way to change it. Consumers build a
//! [`Session`], feed it connection changes, and drive mints and withdrawals;
//! every state change is mirrored on the [`EventBus`].
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the orchestrator and builder
//! - [`resolver`] produces and memoizes the contract handle
//! - [`fetcher`] builds read snapshots from independent reads
//! - [`controller`] runs the per-kind transaction lifecycle
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`api`] exposes the error types downstream clients interact with
pub mod api;
pub mod controller;
pub mod events;
pub mod fetcher;
pub mod resolver;
pub mod session;

pub use api::{ResolveError, Result, SessionError};
pub use controller::{AttemptSlots, SuccessMessages, TxController};
pub use events::{Event, EventBus, HandleEvent, ReadModelEvent, Topic, TxEvent};
pub use fetcher::ReadModelFetcher;
pub use resolver::{HandleResolver, HandleStatus, is_placeholder};
pub use session::{Session, SessionBuilder, SessionConfig};
