//! Contract handle resolution.
//!
//! A [`HandleResolver`] turns the static deployment coordinates plus the
//! current connection into a [`ContractHandle`], probing the endpoint once per
//! (endpoint, contract, identity, network) key. The outcome, successful or not,
//! is memoized until the key changes; every change of key bumps the handle
//! generation so stale handles can be told apart.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use client_blockchain_core::{
    ChainTransport, ConnectionState, ContractHandle, ContractId, InterfaceDescriptor,
    NetworkEndpoint,
};
use token_core::AddressFormat;

use crate::api::ResolveError;
use crate::events::{Event, EventBus, HandleEvent};

/// What the banner shows about the contract handle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HandleStatus {
    #[default]
    Unresolved,
    Connecting,
    Ready,
    NotDeployed(String),
    NetworkMismatch { expected: String, actual: String },
}

impl HandleStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, HandleStatus::Ready)
    }
}

impl fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleStatus::Unresolved => f.write_str("not connected"),
            HandleStatus::Connecting => f.write_str("connecting to contract..."),
            HandleStatus::Ready => f.write_str("ready"),
            HandleStatus::NotDeployed(reason) => write!(f, "contract not deployed: {reason}"),
            HandleStatus::NetworkMismatch { expected, actual } => {
                write!(f, "wrong network: switch wallet from {actual} to {expected}")
            }
        }
    }
}

/// Whether a configured contract id is a stand-in rather than a deployment.
pub fn is_placeholder(id: &str, format: AddressFormat) -> bool {
    let id = id.trim();
    id.is_empty()
        || id.to_ascii_uppercase().contains("PLACEHOLDER")
        || id.contains("{{")
        || format.is_zero(id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HandleKey {
    rpc_url: String,
    contract: String,
    identity: String,
    network: String,
}

#[derive(Default)]
struct Resolved {
    key: Option<HandleKey>,
    outcome: Option<Result<Arc<ContractHandle>, ResolveError>>,
}

pub struct HandleResolver {
    transport: Arc<dyn ChainTransport>,
    endpoint: NetworkEndpoint,
    contract: ContractId,
    interface: InterfaceDescriptor,
    format: AddressFormat,
    // Held across the probe so concurrent callers share one resolution.
    resolved: Mutex<Resolved>,
    // Readable without waiting on an in-flight probe.
    generation: AtomicU64,
    status: watch::Sender<HandleStatus>,
    events: EventBus,
}

impl HandleResolver {
    pub fn new(
        transport: Arc<dyn ChainTransport>,
        endpoint: NetworkEndpoint,
        contract: ContractId,
        interface: InterfaceDescriptor,
        events: EventBus,
    ) -> Self {
        let format = interface.chain.address_format();
        let (status, _) = watch::channel(HandleStatus::Unresolved);
        Self {
            transport,
            endpoint,
            contract,
            interface,
            format,
            resolved: Mutex::new(Resolved::default()),
            generation: AtomicU64::new(0),
            status,
            events,
        }
    }

    pub fn status(&self) -> HandleStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<HandleStatus> {
        self.status.subscribe()
    }

    /// Newest handle generation issued so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// The memoized handle, if the last resolution succeeded.
    pub async fn current(&self) -> Option<Arc<ContractHandle>> {
        let resolved = self.resolved.lock().await;
        match &resolved.outcome {
            Some(Ok(handle)) => Some(Arc::clone(handle)),
            _ => None,
        }
    }

    /// Resolve a handle for `connection`, reusing the memoized outcome while
    /// the key is unchanged.
    pub async fn resolve(
        &self,
        connection: &ConnectionState,
    ) -> Result<Arc<ContractHandle>, ResolveError> {
        let ConnectionState::Connected {
            identity, network, ..
        } = connection
        else {
            self.reset().await;
            return Err(ResolveError::NotConnected);
        };

        let key = HandleKey {
            rpc_url: self.endpoint.url.clone(),
            contract: self.contract.0.clone(),
            identity: identity.clone(),
            network: network.clone(),
        };

        let mut resolved = self.resolved.lock().await;
        if resolved.key.as_ref() == Some(&key) {
            if let Some(outcome) = &resolved.outcome {
                return outcome.clone();
            }
        }

        resolved.key = Some(key);
        resolved.outcome = None;
        let generation = self.next_generation();

        let outcome = self.probe(identity, network, generation).await;
        resolved.outcome = Some(outcome.clone());
        outcome
    }

    /// Forget the memoized handle; the next `resolve` probes again.
    pub async fn reset(&self) {
        let mut resolved = self.resolved.lock().await;
        if resolved.key.is_none() && resolved.outcome.is_none() {
            return;
        }
        resolved.key = None;
        resolved.outcome = None;
        let generation = self.next_generation();
        self.set_status(HandleStatus::Unresolved, generation);
    }

    async fn probe(
        &self,
        identity: &str,
        network: &str,
        generation: u64,
    ) -> Result<Arc<ContractHandle>, ResolveError> {
        if network != self.endpoint.network {
            let expected = self.endpoint.network.clone();
            let actual = network.to_string();
            warn!(%expected, %actual, "wallet network does not match deployment");
            self.set_status(
                HandleStatus::NetworkMismatch {
                    expected: expected.clone(),
                    actual: actual.clone(),
                },
                generation,
            );
            return Err(ResolveError::NetworkMismatch { expected, actual });
        }

        if let Some(id) = self.placeholder_id() {
            let reason = format!("contract id {id:?} is a placeholder");
            info!(contract = %self.contract, "{reason}");
            self.set_status(HandleStatus::NotDeployed(reason.clone()), generation);
            return Err(ResolveError::NotDeployed(reason));
        }

        self.set_status(HandleStatus::Connecting, generation);
        let handle = ContractHandle {
            endpoint: self.endpoint.clone(),
            contract: self.contract.clone(),
            interface: self.interface.clone(),
            identity: identity.to_string(),
            generation,
        };

        match self.transport.probe(&handle).await {
            Ok(()) => {
                debug!(
                    transport = self.transport.name(),
                    contract = %self.contract,
                    generation,
                    "contract handle ready"
                );
                self.set_status(HandleStatus::Ready, generation);
                Ok(Arc::new(handle))
            }
            Err(err) => {
                let reason = err.to_string();
                warn!(
                    transport = self.transport.name(),
                    contract = %self.contract,
                    error = %reason,
                    "contract probe failed"
                );
                self.set_status(HandleStatus::NotDeployed(reason.clone()), generation);
                Err(ResolveError::NotDeployed(reason))
            }
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn placeholder_id(&self) -> Option<&str> {
        std::iter::once(self.contract.as_str())
            .chain(self.interface.state_object.as_deref())
            .find(|id| is_placeholder(id, self.format))
    }

    fn set_status(&self, status: HandleStatus, generation: u64) {
        self.status.send_replace(status.clone());
        self.events
            .publish(Event::Handle(HandleEvent { status, generation }));
    }
}
