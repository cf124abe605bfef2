//! The set of actions offered to the user.

use crate::attempt::TxKind;

/// Actions to offer given the current session state.
///
/// Nothing is offered without a connection and a ready contract handle.
/// `Withdraw` is absent, not disabled, for anyone but the owner.
pub fn available_actions(connected: bool, handle_ready: bool, is_owner: bool) -> Vec<TxKind> {
    if !connected || !handle_ready {
        return Vec::new();
    }

    let mut actions = vec![TxKind::Mint];
    if is_owner {
        actions.push(TxKind::Withdraw);
    }
    actions
}
