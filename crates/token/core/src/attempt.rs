//! Transaction attempts and their lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two state-changing operations a session can perform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TxKind {
    Mint,
    Withdraw,
}

/// Monotonic identifier assigned to each accepted attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why an attempt failed. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxFailure {
    /// Signature declined or the submit call failed before broadcast.
    Rejected(String),
    /// The chain executed the call and reverted it.
    Reverted(String),
    /// Finality could not be observed (timeout, lost subscription, RPC failure).
    Finality(String),
}

impl TxFailure {
    pub fn message(&self) -> &str {
        match self {
            TxFailure::Rejected(m) | TxFailure::Reverted(m) | TxFailure::Finality(m) => m,
        }
    }
}

impl fmt::Display for TxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TxStatus {
    #[default]
    Idle,
    Submitting,
    AwaitingFinality,
    /// Carries the success message retained until acknowledged.
    Succeeded(String),
    Failed(TxFailure),
}

impl TxStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, TxStatus::Idle)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, TxStatus::Submitting | TxStatus::AwaitingFinality)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Succeeded(_) | TxStatus::Failed(_))
    }

    /// Short label for logs and events.
    pub fn label(&self) -> &'static str {
        match self {
            TxStatus::Idle => "idle",
            TxStatus::Submitting => "submitting",
            TxStatus::AwaitingFinality => "awaiting_finality",
            TxStatus::Succeeded(_) => "succeeded",
            TxStatus::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Succeeded(message) => write!(f, "succeeded: {message}"),
            TxStatus::Failed(reason) => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// A single user-initiated mint or withdraw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxAttempt {
    pub id: AttemptId,
    pub kind: TxKind,
    pub status: TxStatus,
}

impl TxAttempt {
    pub fn new(id: AttemptId, kind: TxKind) -> Self {
        Self {
            id,
            kind,
            status: TxStatus::Submitting,
        }
    }
}
