//! Transaction lifecycle controller.
//!
//! Each [`TxKind`] has one slot. A slot moves
//! `Idle → Submitting → AwaitingFinality → Succeeded | Failed` and only
//! returns to `Idle` when the caller acknowledges the terminal status. While a
//! slot is not `Idle`, new requests of that kind are turned away before any
//! network contact.
//!
//! Every transition is traced and published as a [`TxEvent`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use client_blockchain_core::{
    ChainTransport, ContractCall, ContractHandle, Finality, FinalityStatus, PendingTx,
    Subscription, TransportError, Wallet,
};
use token_core::{AttemptId, ContractConfig, TxAttempt, TxFailure, TxKind, TxStatus};

use crate::api::SessionError;
use crate::events::{Event, EventBus, TxEvent};

const FINALITY_TIMEOUT: &str = "timed out waiting for finality";

/// Current attempt per kind; `None` means `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptSlots {
    pub mint: Option<TxAttempt>,
    pub withdraw: Option<TxAttempt>,
}

impl AttemptSlots {
    pub fn get(&self, kind: TxKind) -> Option<&TxAttempt> {
        match kind {
            TxKind::Mint => self.mint.as_ref(),
            TxKind::Withdraw => self.withdraw.as_ref(),
        }
    }

    fn get_mut(&mut self, kind: TxKind) -> &mut Option<TxAttempt> {
        match kind {
            TxKind::Mint => &mut self.mint,
            TxKind::Withdraw => &mut self.withdraw,
        }
    }

    pub fn status(&self, kind: TxKind) -> TxStatus {
        self.get(kind)
            .map(|attempt| attempt.status.clone())
            .unwrap_or_default()
    }
}

/// Success wording for a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessMessages {
    minted: String,
    explorer_url: Option<String>,
}

impl SuccessMessages {
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            minted: format!(
                "Minted {} {} tokens!",
                config.mint_amount_tokens(),
                config.symbol
            ),
            explorer_url: config.explorer_url.clone(),
        }
    }

    pub fn render(&self, kind: TxKind, emitted_events: usize, tx: &PendingTx) -> String {
        let text = match kind {
            TxKind::Mint if emitted_events > 0 => self.minted.as_str(),
            TxKind::Mint => "Transaction finalized. Check your balance.",
            TxKind::Withdraw => "Successfully withdrew contract funds!",
        };
        match &self.explorer_url {
            Some(base) => format!("{text} {}/{}", base.trim_end_matches('/'), tx.id),
            None => text.to_string(),
        }
    }
}

pub struct TxController {
    transport: Arc<dyn ChainTransport>,
    slots: watch::Sender<AttemptSlots>,
    next_id: AtomicU64,
    finality_timeout: Duration,
    messages: SuccessMessages,
    events: EventBus,
}

impl TxController {
    pub fn new(
        transport: Arc<dyn ChainTransport>,
        finality_timeout: Duration,
        messages: SuccessMessages,
        events: EventBus,
    ) -> Self {
        let (slots, _) = watch::channel(AttemptSlots::default());
        Self {
            transport,
            slots,
            next_id: AtomicU64::new(1),
            finality_timeout,
            messages,
            events,
        }
    }

    pub fn slots(&self) -> AttemptSlots {
        self.slots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AttemptSlots> {
        self.slots.subscribe()
    }

    pub fn attempt(&self, kind: TxKind) -> Option<TxAttempt> {
        self.slots.borrow().get(kind).cloned()
    }

    pub fn status(&self, kind: TxKind) -> TxStatus {
        self.slots.borrow().status(kind)
    }

    /// Claim the slot for `kind`. Fails without side effects unless it is `Idle`.
    pub fn begin(&self, kind: TxKind) -> Result<AttemptId, SessionError> {
        let mut claimed = None;
        let mut current = TxStatus::Idle;
        self.slots.send_if_modified(|slots| {
            let slot = slots.get_mut(kind);
            if let Some(attempt) = slot.as_ref() {
                current = attempt.status.clone();
                return false;
            }
            let id = AttemptId(self.next_id.fetch_add(1, Ordering::Relaxed));
            *slot = Some(TxAttempt::new(id, kind));
            claimed = Some(id);
            true
        });

        match claimed {
            Some(id) => {
                self.announce(id, kind, &TxStatus::Submitting);
                Ok(id)
            }
            None => {
                info!(kind = %kind, current = current.label(), "attempt rejected, slot busy");
                self.events.publish(Event::Transaction(TxEvent::Rejected {
                    kind,
                    current,
                }));
                Err(SessionError::AttemptInFlight(kind))
            }
        }
    }

    /// Drive a claimed attempt to its terminal status.
    ///
    /// `reconcile` runs after the outcome is known and before the terminal
    /// status is published, so readers of the slot never see success paired
    /// with a pre-transaction snapshot.
    pub async fn run<R, Fut>(
        &self,
        id: AttemptId,
        handle: &ContractHandle,
        call: ContractCall,
        wallet: &dyn Wallet,
        reconcile: R,
    ) -> TxStatus
    where
        R: FnOnce() -> Fut,
        Fut: Future<Output = ()>,
    {
        let kind = call.kind;
        let mut guard = AbandonGuard {
            controller: self,
            id,
            kind,
            settled: None,
            armed: true,
        };

        let status = match self.transport.submit(handle, &call, wallet).await {
            Ok(pending) => {
                info!(attempt = %id, kind = %kind, tx = %pending.id, "transaction submitted");
                self.transition(id, kind, TxStatus::AwaitingFinality);
                match self.observe(id, kind, handle, &pending).await {
                    Ok(FinalityStatus::Finalized { emitted_events }) => {
                        TxStatus::Succeeded(self.messages.render(kind, emitted_events, &pending))
                    }
                    Ok(FinalityStatus::Failed(dispatch)) => {
                        TxStatus::Failed(TxFailure::Reverted(dispatch.to_string()))
                    }
                    Ok(other) => TxStatus::Failed(TxFailure::Finality(format!(
                        "finality ended without a terminal status ({other:?})"
                    ))),
                    Err(TransportError::Reverted(reason)) => {
                        TxStatus::Failed(TxFailure::Reverted(reason))
                    }
                    Err(err) => TxStatus::Failed(TxFailure::Finality(err.to_string())),
                }
            }
            Err(err) => {
                warn!(attempt = %id, kind = %kind, error = %err, "submission rejected");
                TxStatus::Failed(TxFailure::Rejected(err.to_string()))
            }
        };

        // From here a drop publishes the known outcome instead of abandoning it.
        guard.settled = Some(status.clone());
        reconcile().await;
        guard.armed = false;
        self.transition(id, kind, status.clone());
        status
    }

    /// Return a terminal slot to `Idle`. In-flight or idle slots are left alone.
    pub fn acknowledge(&self, kind: TxKind) -> bool {
        let mut cleared = None;
        self.slots.send_if_modified(|slots| {
            let slot = slots.get_mut(kind);
            if slot
                .as_ref()
                .is_some_and(|attempt| attempt.status.is_terminal())
            {
                cleared = slot.take().map(|attempt| attempt.id);
                return true;
            }
            false
        });

        match cleared {
            Some(id) => {
                self.announce(id, kind, &TxStatus::Idle);
                true
            }
            None => false,
        }
    }

    async fn observe(
        &self,
        id: AttemptId,
        kind: TxKind,
        handle: &ContractHandle,
        pending: &PendingTx,
    ) -> Result<FinalityStatus, TransportError> {
        match self.transport.finality(handle, pending).await? {
            Finality::Awaited(outcome) => {
                match tokio::time::timeout(self.finality_timeout, outcome).await {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Finality(FINALITY_TIMEOUT.to_string())),
                }
            }
            Finality::Subscribed(mut subscription) => {
                let outcome = tokio::time::timeout(
                    self.finality_timeout,
                    self.follow(id, kind, &mut subscription),
                )
                .await;
                subscription.unsubscribe();
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Finality(FINALITY_TIMEOUT.to_string())),
                }
            }
        }
    }

    async fn follow(
        &self,
        id: AttemptId,
        kind: TxKind,
        subscription: &mut Subscription,
    ) -> Result<FinalityStatus, TransportError> {
        while let Some(update) = subscription.next().await {
            match update? {
                FinalityStatus::Pending => {}
                FinalityStatus::InBlock => {
                    info!(attempt = %id, kind = %kind, "transaction in block");
                    self.events.publish(Event::Transaction(TxEvent::Progress {
                        attempt: id,
                        kind,
                        message: "Transaction in block...".to_string(),
                    }));
                }
                terminal => return Ok(terminal),
            }
        }
        Err(TransportError::Finality(
            "finality subscription closed before a terminal status".to_string(),
        ))
    }

    fn transition(&self, id: AttemptId, kind: TxKind, status: TxStatus) {
        let updated = self.slots.send_if_modified(|slots| match slots.get_mut(kind) {
            Some(attempt) if attempt.id == id => {
                attempt.status = status.clone();
                true
            }
            _ => false,
        });
        if updated {
            self.announce(id, kind, &status);
        }
    }

    fn announce(&self, id: AttemptId, kind: TxKind, status: &TxStatus) {
        match status {
            TxStatus::Failed(reason) => {
                info!(attempt = %id, kind = %kind, status = status.label(), reason = %reason, "attempt transition")
            }
            _ => info!(attempt = %id, kind = %kind, status = status.label(), "attempt transition"),
        }
        self.events.publish(Event::Transaction(TxEvent::Transition {
            attempt: id,
            kind,
            status: status.clone(),
        }));
    }
}

/// Settles the slot if `run` is dropped early, so a cancelled caller cannot
/// leave it stuck in flight. Once the chain has answered, the drop publishes
/// that answer; before then the attempt is failed as abandoned.
struct AbandonGuard<'a> {
    controller: &'a TxController,
    id: AttemptId,
    kind: TxKind,
    settled: Option<TxStatus>,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let status = self.settled.take().unwrap_or_else(|| {
            TxStatus::Failed(TxFailure::Finality(
                "attempt abandoned before completion".to_string(),
            ))
        });
        self.controller.transition(self.id, self.kind, status);
    }
}
