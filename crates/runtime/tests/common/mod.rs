#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use client_blockchain_core::{
    CallArg, ChainTransport, ContractCall, ContractHandle, Finality, InterfaceDescriptor,
    MOCK_NETWORK, MockChain, MockWallet, PendingTx, ReadValue, TransportError, Wallet,
};
use runtime::{Event, Session, TxEvent};
use token_core::{Chain, ContractConfig, TxStatus};
use tokio::sync::broadcast;

pub const OWNER: &str = "0x1111111111111111111111111111111111111111";
pub const USER: &str = "0x2222222222222222222222222222222222222222";
pub const CONTRACT: &str = "0x00000000000000000000000000000000000000c0";
/// 0.01 native units at 18 decimals.
pub const PRICE: u128 = 10_000_000_000_000_000;

pub fn contract() -> ContractConfig {
    ContractConfig {
        chain: Chain::Ethereum,
        network: MOCK_NETWORK.into(),
        rpc_url: "http://localhost:8545".into(),
        contract_id: CONTRACT.into(),
        module: None,
        state_object: None,
        symbol: "IABS".into(),
        token_decimals: 0,
        native_decimals: 18,
        mint_price: PRICE,
        mint_amount: 1000,
        explorer_url: None,
    }
}

/// Mock interface without the optional price view.
pub fn interface(chain: Chain) -> InterfaceDescriptor {
    let mut interface = MockChain::interface(chain);
    interface.methods.mint_price = None;
    interface
}

pub fn session(chain: &MockChain) -> Arc<Session> {
    session_with(chain, contract(), interface(Chain::Ethereum))
}

pub fn session_with(
    chain: &MockChain,
    contract: ContractConfig,
    interface: InterfaceDescriptor,
) -> Arc<Session> {
    build(Arc::new(chain.clone()), contract, interface)
}

pub fn session_over(transport: Arc<dyn ChainTransport>) -> Arc<Session> {
    build(transport, contract(), interface(Chain::Ethereum))
}

fn build(
    transport: Arc<dyn ChainTransport>,
    contract: ContractConfig,
    interface: InterfaceDescriptor,
) -> Arc<Session> {
    let session = Session::builder()
        .contract(contract)
        .interface(interface)
        .transport(transport)
        .finality_timeout(Duration::from_secs(60))
        .build()
        .expect("session should build");
    Arc::new(session)
}

pub async fn connect(session: &Session, identity: &str) -> Arc<MockWallet> {
    let wallet = Arc::new(MockWallet::new(identity));
    session
        .connect(wallet.clone() as Arc<dyn Wallet>, None)
        .await
        .expect("mock wallet should connect");
    wallet
}

/// Drain every transition currently buffered on a transaction subscription.
pub fn transitions(rx: &mut broadcast::Receiver<Event>) -> Vec<TxStatus> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Transaction(TxEvent::Transition { status, .. }) = event {
            seen.push(status);
        }
    }
    seen
}

/// Wraps a [`MockChain`] so reads behave differently per calling identity.
pub struct PerIdentityReads {
    chain: MockChain,
    delays: HashMap<String, Duration>,
    failures: HashSet<(String, String)>,
}

impl PerIdentityReads {
    pub fn new(chain: &MockChain) -> Self {
        Self {
            chain: chain.clone(),
            delays: HashMap::new(),
            failures: HashSet::new(),
        }
    }

    /// Every read made through a handle for `identity` takes `delay`.
    pub fn delay(mut self, identity: &str, delay: Duration) -> Self {
        self.delays.insert(identity.to_string(), delay);
        self
    }

    /// `method` fails for handles resolved for `identity`.
    pub fn fail(mut self, identity: &str, method: &str) -> Self {
        self.failures
            .insert((identity.to_string(), method.to_string()));
        self
    }
}

#[async_trait]
impl ChainTransport for PerIdentityReads {
    fn name(&self) -> &str {
        "per-identity"
    }

    async fn probe(&self, handle: &ContractHandle) -> Result<(), TransportError> {
        self.chain.probe(handle).await
    }

    async fn read(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[CallArg],
    ) -> Result<ReadValue, TransportError> {
        if let Some(delay) = self.delays.get(&handle.identity) {
            tokio::time::sleep(*delay).await;
        }
        if self
            .failures
            .contains(&(handle.identity.clone(), method.to_string()))
        {
            return Err(TransportError::ReadFailed {
                method: method.to_string(),
                reason: "view not available".into(),
            });
        }
        self.chain.read(handle, method, args).await
    }

    async fn submit(
        &self,
        handle: &ContractHandle,
        call: &ContractCall,
        wallet: &dyn Wallet,
    ) -> Result<PendingTx, TransportError> {
        self.chain.submit(handle, call, wallet).await
    }

    async fn finality(
        &self,
        handle: &ContractHandle,
        pending: &PendingTx,
    ) -> Result<Finality, TransportError> {
        self.chain.finality(handle, pending).await
    }
}
