//! Event types for different topics.

use serde::{Deserialize, Serialize};
use token_core::{AttemptId, ReadField, TxKind, TxStatus};

use crate::resolver::HandleStatus;

/// Transaction lifecycle events, one per controller state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxEvent {
    /// The attempt moved to `status`.
    Transition {
        attempt: AttemptId,
        kind: TxKind,
        status: TxStatus,
    },

    /// Non-terminal progress (e.g. included in a block).
    Progress {
        attempt: AttemptId,
        kind: TxKind,
        message: String,
    },

    /// A request was turned away because an attempt of this kind is not idle.
    Rejected { kind: TxKind, current: TxStatus },
}

/// Read-model events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadModelEvent {
    /// A new snapshot replaced the previous one.
    Refreshed { version: u64, failed: Vec<ReadField> },

    /// One read failed; its previous value was kept.
    FieldFailed { field: ReadField, reason: String },
}

/// Contract handle status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleEvent {
    pub status: HandleStatus,
    pub generation: u64,
}
