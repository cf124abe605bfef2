//! Finality observation: a single awaited call or a status subscription.

use std::future::Future;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::traits::TransportError;
use crate::types::FinalityStatus;

pub type FinalityFuture = BoxFuture<'static, Result<FinalityStatus, TransportError>>;

/// How an adapter reports the outcome of a submitted transaction.
pub enum Finality {
    /// Resolves once with a terminal status.
    Awaited(FinalityFuture),
    /// Pushes status updates until a terminal one. Must be unsubscribed.
    Subscribed(Subscription),
}

impl std::fmt::Debug for Finality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Finality::Awaited(_) => f.write_str("Finality::Awaited"),
            Finality::Subscribed(sub) => f
                .debug_tuple("Finality::Subscribed")
                .field(&sub.is_active())
                .finish(),
        }
    }
}

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Live status subscription.
///
/// The teardown closure runs at most once: on the first explicit
/// [`unsubscribe`](Subscription::unsubscribe) or on drop, whichever comes first.
pub struct Subscription {
    updates: mpsc::Receiver<Result<FinalityStatus, TransportError>>,
    unsubscribe: Option<Unsubscribe>,
}

impl Subscription {
    pub fn new(
        updates: mpsc::Receiver<Result<FinalityStatus, TransportError>>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            updates,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Next status update; `None` once the source has gone away.
    pub async fn next(&mut self) -> Option<Result<FinalityStatus, TransportError>> {
        if self.unsubscribe.is_none() {
            return None;
        }
        self.updates.recv().await
    }

    pub fn unsubscribe(&mut self) {
        if let Some(teardown) = self.unsubscribe.take() {
            self.updates.close();
            teardown();
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Builds an awaited finality future by polling `check` every `interval`
/// until it reports a terminal status or fails.
pub fn poll_finality<F, Fut>(interval: Duration, mut check: F) -> FinalityFuture
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<FinalityStatus, TransportError>> + Send + 'static,
{
    Box::pin(async move {
        loop {
            let status = check().await?;
            if status.is_terminal() {
                return Ok(status);
            }
            tracing::trace!(?status, "transaction not final yet");
            tokio::time::sleep(interval).await;
        }
    })
}
