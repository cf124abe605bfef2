//! Session orchestrator.
//!
//! A [`Session`] is the one explicitly constructed owner of everything tied to
//! a deployment: the handle resolver, the read model and the transaction
//! slots. Connection changes flow in through [`Session::set_connection`] (or
//! the [`Session::connect`] convenience) and everything downstream is derived
//! from them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use client_blockchain_core::{
    ChainTransport, ConnectionState, ContractCall, ContractHandle, ContractId,
    InterfaceDescriptor, NetworkEndpoint, Wallet, WalletError,
};
use token_core::{
    AddressFormat, Amount, ContractConfig, ReadSnapshot, TxAttempt, TxKind, TxStatus,
    available_actions, is_owner,
};

use crate::api::{Result, SessionError};
use crate::controller::{AttemptSlots, SuccessMessages, TxController};
use crate::events::{Event, EventBus, Topic};
use crate::fetcher::ReadModelFetcher;
use crate::resolver::{HandleResolver, HandleStatus};

/// Session tuning shared by the resolver, fetcher and controller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait for finality before failing the attempt.
    pub finality_timeout: Duration,
    pub event_buffer_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            finality_timeout: Duration::from_secs(60),
            event_buffer_size: 100,
        }
    }
}

pub struct Session {
    contract: ContractConfig,
    format: AddressFormat,
    connection: watch::Sender<ConnectionState>,
    resolver: HandleResolver,
    fetcher: ReadModelFetcher,
    controller: TxController,
    events: EventBus,
}

impl Session {
    /// Create a new session builder
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn contract(&self) -> &ContractConfig {
        &self.contract
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to one event topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection.borrow().clone()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    pub fn snapshot(&self) -> Arc<ReadSnapshot> {
        self.fetcher.snapshot()
    }

    pub fn watch_snapshot(&self) -> watch::Receiver<Arc<ReadSnapshot>> {
        self.fetcher.watch()
    }

    pub fn handle_status(&self) -> HandleStatus {
        self.resolver.status()
    }

    pub fn watch_handle_status(&self) -> watch::Receiver<HandleStatus> {
        self.resolver.watch_status()
    }

    pub fn attempt(&self, kind: TxKind) -> Option<TxAttempt> {
        self.controller.attempt(kind)
    }

    pub fn attempts(&self) -> AttemptSlots {
        self.controller.slots()
    }

    pub fn watch_attempts(&self) -> watch::Receiver<AttemptSlots> {
        self.controller.watch()
    }

    /// Whether the connected identity owns the contract per the latest snapshot.
    pub fn is_owner(&self) -> bool {
        let connection = self.connection.borrow();
        connection
            .identity()
            .is_some_and(|identity| is_owner(&self.snapshot(), identity, self.format))
    }

    pub fn available_actions(&self) -> Vec<TxKind> {
        available_actions(
            self.connection.borrow().is_connected(),
            self.resolver.status().is_ready(),
            self.is_owner(),
        )
    }

    // ========================================================================
    // Connection lifecycle
    // ========================================================================

    /// Connect through `wallet`, using `preferred` when the wallet offers it
    /// and the first account otherwise.
    pub async fn connect(
        &self,
        wallet: Arc<dyn Wallet>,
        preferred: Option<&str>,
    ) -> Result<HandleStatus> {
        self.connection.send_replace(ConnectionState::Connecting);

        let identity = match self.pick_account(wallet.as_ref(), preferred).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(wallet = wallet.name(), error = %err, "wallet connection failed");
                self.set_connection(ConnectionState::Disconnected).await;
                return Err(err.into());
            }
        };
        let network = match wallet.network().await {
            Ok(network) => network,
            Err(err) => {
                warn!(wallet = wallet.name(), error = %err, "wallet network unavailable");
                self.set_connection(ConnectionState::Disconnected).await;
                return Err(err.into());
            }
        };

        info!(wallet = wallet.name(), %identity, %network, "wallet connected");
        Ok(self
            .set_connection(ConnectionState::Connected {
                identity,
                network,
                signer: wallet,
            })
            .await)
    }

    async fn pick_account(
        &self,
        wallet: &dyn Wallet,
        preferred: Option<&str>,
    ) -> std::result::Result<String, WalletError> {
        let accounts = wallet.accounts().await?;
        match preferred {
            Some(wanted) => accounts
                .into_iter()
                .find(|account| account == wanted || self.format.same_identity(account, wanted))
                .ok_or_else(|| WalletError::Other(format!("account {wanted} not available"))),
            None => accounts.into_iter().next().ok_or(WalletError::NoAccounts),
        }
    }

    /// Apply a connection change: re-resolve the handle and, when it is ready,
    /// fetch the read model.
    pub async fn set_connection(&self, state: ConnectionState) -> HandleStatus {
        let previous = self.connection.borrow().identity().map(str::to_string);
        if previous.as_deref() != state.identity() {
            // Every handle issued so far was read through for the old identity.
            self.fetcher.reset(self.resolver.generation()).await;
        }
        self.connection.send_replace(state.clone());

        if !state.is_connected() {
            self.resolver.reset().await;
            return self.resolver.status();
        }

        match self.resolver.resolve(&state).await {
            Ok(handle) if self.is_current(&handle) => {
                self.fetcher.fetch(&handle).await;
            }
            Ok(handle) => debug!(
                identity = %handle.identity,
                "connection changed during resolution, skipping fetch"
            ),
            Err(err) => info!(error = %err, "contract handle unavailable"),
        }
        self.resolver.status()
    }

    pub async fn disconnect(&self) {
        self.set_connection(ConnectionState::Disconnected).await;
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Run a fetch cycle now.
    pub async fn refresh(&self) -> Result<Arc<ReadSnapshot>> {
        let (handle, _) = self.ready().await?;
        Ok(self.fetcher.fetch(&handle).await)
    }

    async fn reconcile(&self) {
        if let Err(err) = self.refresh().await {
            warn!(error = %err, "read model not reconciled");
        }
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Mint, paying the on-chain price when the contract exposes one.
    pub async fn mint(&self) -> Result<TxStatus> {
        let (handle, signer) = self.ready().await?;
        let id = self.controller.begin(TxKind::Mint)?;

        let payment = self
            .snapshot()
            .mint_price
            .map(|price| price.base())
            .unwrap_or(self.contract.mint_price);
        let call = ContractCall {
            kind: TxKind::Mint,
            method: handle.methods().mint.clone(),
            payment,
            amount: None,
        };

        Ok(self
            .controller
            .run(id, &handle, call, signer.as_ref(), || self.reconcile())
            .await)
    }

    /// Withdraw contract funds; `None` withdraws the whole contract balance.
    pub async fn withdraw(&self, amount: Option<Amount>) -> Result<TxStatus> {
        let (handle, signer) = self.ready().await?;
        if !self.is_owner() {
            return Err(SessionError::ActionUnavailable(TxKind::Withdraw));
        }
        let amount = match amount {
            Some(amount) if amount.decimals() != self.contract.native_decimals => {
                return Err(SessionError::AmountScale {
                    expected: self.contract.native_decimals,
                    actual: amount.decimals(),
                });
            }
            Some(amount) => amount.base(),
            None => self.snapshot().contract_balance.base(),
        };
        let id = self.controller.begin(TxKind::Withdraw)?;

        let call = ContractCall {
            kind: TxKind::Withdraw,
            method: handle.methods().withdraw.clone(),
            payment: 0,
            amount: Some(amount),
        };

        Ok(self
            .controller
            .run(id, &handle, call, signer.as_ref(), || self.reconcile())
            .await)
    }

    /// Clear a terminal attempt back to `Idle`.
    pub fn acknowledge(&self, kind: TxKind) -> bool {
        self.controller.acknowledge(kind)
    }

    /// Whether `handle` was resolved for the identity connected right now.
    fn is_current(&self, handle: &ContractHandle) -> bool {
        self.connection
            .borrow()
            .identity()
            .is_some_and(|identity| self.format.same_identity(&handle.identity, identity))
    }

    async fn ready(&self) -> Result<(Arc<ContractHandle>, Arc<dyn Wallet>)> {
        let signer = self
            .connection
            .borrow()
            .signer()
            .ok_or(SessionError::NotConnected)?;
        match self.resolver.current().await {
            Some(handle) if self.is_current(&handle) => Ok((handle, signer)),
            Some(handle) => {
                warn!(
                    identity = %handle.identity,
                    generation = handle.generation,
                    "contract handle belongs to a previous connection"
                );
                Err(SessionError::HandleUnavailable(
                    "connection changed; contract handle is being resolved again".into(),
                ))
            }
            None => Err(match self.resolver.status() {
                HandleStatus::NetworkMismatch { expected, actual } => {
                    SessionError::NetworkMismatch { expected, actual }
                }
                HandleStatus::NotDeployed(reason) => SessionError::HandleUnavailable(reason),
                other => SessionError::HandleUnavailable(other.to_string()),
            }),
        }
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: SessionConfig,
    contract: Option<ContractConfig>,
    interface: Option<InterfaceDescriptor>,
    transport: Option<Arc<dyn ChainTransport>>,
}

impl SessionBuilder {
    fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            contract: None,
            interface: None,
            transport: None,
        }
    }

    /// Override session configuration
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the deployment to talk to (required)
    pub fn contract(mut self, contract: ContractConfig) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Set the method names for the deployment (required)
    pub fn interface(mut self, interface: InterfaceDescriptor) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Set the chain adapter (required)
    pub fn transport(mut self, transport: Arc<dyn ChainTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn finality_timeout(mut self, timeout: Duration) -> Self {
        self.config.finality_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Session> {
        let contract = self
            .contract
            .ok_or(SessionError::MissingComponent("a contract configuration"))?;
        let interface = self
            .interface
            .ok_or(SessionError::MissingComponent("an interface descriptor"))?;
        let transport = self
            .transport
            .ok_or(SessionError::MissingComponent("a chain transport"))?;

        contract
            .check_amounts()
            .map_err(SessionError::InvalidConfig)?;
        if interface.chain != contract.chain {
            return Err(SessionError::InvalidConfig(format!(
                "interface is for {}, contract is on {}",
                interface.chain, contract.chain
            )));
        }

        let events = EventBus::with_capacity(self.config.event_buffer_size);
        let endpoint = NetworkEndpoint {
            network: contract.network.clone(),
            url: contract.rpc_url.clone(),
        };
        let resolver = HandleResolver::new(
            Arc::clone(&transport),
            endpoint,
            ContractId::new(contract.contract_id.clone()),
            interface,
            events.clone(),
        );
        let fetcher = ReadModelFetcher::new(
            Arc::clone(&transport),
            contract.token_decimals,
            contract.native_decimals,
            events.clone(),
        );
        let controller = TxController::new(
            transport,
            self.config.finality_timeout,
            SuccessMessages::new(&contract),
            events.clone(),
        );
        let (connection, _) = watch::channel(ConnectionState::Disconnected);

        Ok(Session {
            format: contract.address_format(),
            contract,
            connection,
            resolver,
            fetcher,
            controller,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use client_blockchain_core::{MOCK_NETWORK, MockChain, MockWallet};
    use token_core::Chain;

    use super::*;

    const OWNER: &str = "0x1111111111111111111111111111111111111111";
    const USER: &str = "0x2222222222222222222222222222222222222222";

    fn session(chain: &MockChain) -> Session {
        let mut interface = MockChain::interface(Chain::Ethereum);
        interface.methods.mint_price = None;
        Session::builder()
            .contract(ContractConfig {
                chain: Chain::Ethereum,
                network: MOCK_NETWORK.into(),
                rpc_url: "http://localhost:8545".into(),
                contract_id: "0x00000000000000000000000000000000000000c0".into(),
                module: None,
                state_object: None,
                symbol: "IABS".into(),
                token_decimals: 0,
                native_decimals: 18,
                mint_price: 1,
                mint_amount: 1000,
                explorer_url: None,
            })
            .interface(interface)
            .transport(Arc::new(chain.clone()))
            .build()
            .unwrap()
    }

    fn connected(identity: &str) -> ConnectionState {
        ConnectionState::Connected {
            identity: identity.into(),
            network: MOCK_NETWORK.into(),
            signer: Arc::new(MockWallet::new(identity)),
        }
    }

    #[tokio::test]
    async fn handle_for_another_identity_is_never_signed_against() {
        let chain = MockChain::new(OWNER);
        let session = session(&chain);
        session.set_connection(connected(OWNER)).await;
        assert!(session.mint().await.is_ok());
        assert!(session.acknowledge(TxKind::Mint));

        // The connection has moved on but the resolver still holds OWNER's handle.
        session.connection.send_replace(connected(USER));
        let err = session.mint().await.unwrap_err();
        assert!(matches!(err, SessionError::HandleUnavailable(_)));
        assert!(session.refresh().await.is_err());
        assert_eq!(chain.submissions(), 1);
        assert!(session.attempt(TxKind::Mint).is_none());

        session.set_connection(connected(USER)).await;
        assert!(session.mint().await.is_ok());
        assert_eq!(chain.submissions(), 2);
    }

    #[tokio::test]
    async fn same_identity_in_another_spelling_is_current() {
        let chain = MockChain::new(OWNER);
        let session = session(&chain);
        session.set_connection(connected(OWNER)).await;

        let shouting = format!("0x{}", OWNER[2..].to_ascii_uppercase());
        session.connection.send_replace(connected(&shouting));
        assert!(session.refresh().await.is_ok());
    }
}
