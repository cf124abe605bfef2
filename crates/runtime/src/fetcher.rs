//! Read-model fetcher.
//!
//! Issues the snapshot reads concurrently and folds them into a fresh
//! [`ReadSnapshot`]. A failed read never aborts the others: the field keeps
//! its previous value and the failure is logged and published.
//!
//! Reads run outside the publication lock. A cycle publishes only if no newer
//! cycle has published first and its handle was not retired by [`ReadModelFetcher::reset`];
//! previous values are only carried over between cycles of the same handle
//! generation, so one identity's data never leaks into another's snapshot.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use client_blockchain_core::{
    CallArg, ChainTransport, ContractHandle, ReadValue, TransportError,
};
use token_core::{Amount, ReadField, ReadSnapshot};

use crate::events::{Event, EventBus, ReadModelEvent};

pub struct ReadModelFetcher {
    transport: Arc<dyn ChainTransport>,
    token_decimals: u8,
    native_decimals: u8,
    snapshot: watch::Sender<Arc<ReadSnapshot>>,
    // Publication is serialized so versions stay strictly increasing.
    cycle: Mutex<Cycle>,
    events: EventBus,
}

#[derive(Debug, Default)]
struct Cycle {
    /// Ticket handed to the newest cycle to start.
    issued: u64,
    /// Ticket and handle generation behind the published snapshot.
    published: u64,
    generation: u64,
    /// Handles at or below this generation belong to a superseded connection.
    retired: u64,
}

impl ReadModelFetcher {
    pub fn new(
        transport: Arc<dyn ChainTransport>,
        token_decimals: u8,
        native_decimals: u8,
        events: EventBus,
    ) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(ReadSnapshot::empty(
            token_decimals,
            native_decimals,
        )));
        Self {
            transport,
            token_decimals,
            native_decimals,
            snapshot,
            cycle: Mutex::new(Cycle::default()),
            events,
        }
    }

    /// Latest completed snapshot.
    pub fn snapshot(&self) -> Arc<ReadSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    pub fn watch(&self) -> watch::Receiver<Arc<ReadSnapshot>> {
        self.snapshot.subscribe()
    }

    /// Drop back to the zero-sentinel snapshot (identity changed or disconnected)
    /// and discard any in-flight cycle for a handle up to `retired`.
    pub async fn reset(&self, retired: u64) {
        let mut cycle = self.cycle.lock().await;
        cycle.retired = cycle.retired.max(retired);
        cycle.generation = cycle.retired;

        let version = self.snapshot.borrow().version;
        let mut empty = ReadSnapshot::empty(self.token_decimals, self.native_decimals);
        if version > 0 {
            empty.version = version + 1;
        }
        self.snapshot.send_replace(Arc::new(empty));
    }

    /// Run one fetch cycle against `handle` and publish the new snapshot.
    ///
    /// Returns the snapshot in effect afterwards; when the cycle was
    /// superseded that is the newer snapshot, not this cycle's reads.
    pub async fn fetch(&self, handle: &ContractHandle) -> Arc<ReadSnapshot> {
        let ticket = {
            let mut cycle = self.cycle.lock().await;
            cycle.issued += 1;
            cycle.issued
        };
        let methods = handle.methods();
        let caller = [CallArg::Identity(handle.identity.clone())];

        let (owner, total_supply, contract_balance, caller_balance, mint_price) = tokio::join!(
            self.read(handle, &methods.owner, &[]),
            self.read(handle, &methods.total_supply, &[]),
            self.read(handle, &methods.contract_balance, &[]),
            self.read(handle, &methods.balance_of, &caller),
            async {
                match &methods.mint_price {
                    Some(method) => Some(self.read(handle, method, &[]).await),
                    None => None,
                }
            },
        );

        let mut cycle = self.cycle.lock().await;
        if handle.generation <= cycle.retired
            || handle.generation < cycle.generation
            || ticket < cycle.published
        {
            debug!(
                generation = handle.generation,
                ticket, "discarding reads from a superseded cycle"
            );
            return self.snapshot();
        }

        let current = self.snapshot();
        let previous = if handle.generation == cycle.generation {
            Arc::clone(&current)
        } else {
            Arc::new(ReadSnapshot::empty(self.token_decimals, self.native_decimals))
        };
        let mut failed = Vec::new();
        let mut keep = |field: ReadField, err: TransportError| {
            warn!(
                field = %field,
                contract = %handle.contract,
                error = %err,
                "read failed, keeping previous value"
            );
            self.events.publish(Event::ReadModel(ReadModelEvent::FieldFailed {
                field,
                reason: err.to_string(),
            }));
            failed.push(field);
        };

        let owner = match owner.and_then(ReadValue::into_identity) {
            Ok(owner) => Some(owner),
            Err(err) => {
                keep(ReadField::Owner, err);
                previous.owner.clone()
            }
        };
        let total_supply = match integer(total_supply, self.token_decimals) {
            Ok(amount) => amount,
            Err(err) => {
                keep(ReadField::TotalSupply, err);
                previous.total_supply
            }
        };
        let contract_balance = match integer(contract_balance, self.native_decimals) {
            Ok(amount) => amount,
            Err(err) => {
                keep(ReadField::ContractBalance, err);
                previous.contract_balance
            }
        };
        let caller_balance = match integer(caller_balance, self.token_decimals) {
            Ok(amount) => amount,
            Err(err) => {
                keep(ReadField::CallerBalance, err);
                previous.caller_balance
            }
        };
        let mint_price = match mint_price.map(|read| integer(read, self.native_decimals)) {
            None => None,
            Some(Ok(amount)) => Some(amount),
            Some(Err(err)) => {
                keep(ReadField::MintPrice, err);
                previous.mint_price
            }
        };

        let next = Arc::new(ReadSnapshot {
            owner,
            total_supply,
            contract_balance,
            caller_balance,
            mint_price,
            version: current.version + 1,
        });
        debug!(
            version = next.version,
            failed = failed.len(),
            "read model refreshed"
        );
        cycle.published = ticket;
        cycle.generation = handle.generation;
        self.snapshot.send_replace(Arc::clone(&next));
        self.events.publish(Event::ReadModel(ReadModelEvent::Refreshed {
            version: next.version,
            failed,
        }));
        next
    }

    async fn read(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[CallArg],
    ) -> Result<ReadValue, TransportError> {
        self.transport.read(handle, method, args).await
    }
}

fn integer(read: Result<ReadValue, TransportError>, decimals: u8) -> Result<Amount, TransportError> {
    read.and_then(ReadValue::into_integer)
        .map(|base| Amount::from_base(base, decimals))
}
