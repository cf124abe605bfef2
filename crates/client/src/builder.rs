//! Console builder with dependency injection pattern.

use std::sync::Arc;

use anyhow::{Context, Result};
use client_blockchain_core::Wallet;
use runtime::Session;

use crate::Console;

/// Builder for constructing a [`Console`].
///
/// Session and wallet are required; the preferred identity is optional and
/// falls back to the wallet's first account.
#[derive(Default)]
pub struct ConsoleBuilder {
    session: Option<Arc<Session>>,
    wallet: Option<Arc<dyn Wallet>>,
    identity: Option<String>,
}

impl ConsoleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session (required).
    ///
    /// Usually assembled by `SessionAssembler` from the `client-bootstrap` crate.
    pub fn session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the wallet used to connect and sign (required).
    pub fn wallet(mut self, wallet: Arc<dyn Wallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Account to connect as.
    pub fn identity(mut self, identity: Option<String>) -> Self {
        self.identity = identity;
        self
    }

    pub fn build(self) -> Result<Console> {
        let session = self
            .session
            .context("Session is required. Use .session() to set it.")?;

        let wallet = self
            .wallet
            .context("Wallet is required. Use .wallet() to set it.")?;

        Ok(Console {
            session,
            wallet,
            identity: self.identity,
        })
    }
}
