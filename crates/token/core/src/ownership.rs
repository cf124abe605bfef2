//! Ownership guard.

use crate::identity::AddressFormat;
use crate::snapshot::ReadSnapshot;

/// Whether `identity` is the contract owner recorded in `snapshot`.
///
/// Both sides are decoded with `format` before comparison, so alternative
/// spellings of one key match. A missing or undecodable owner never matches.
pub fn is_owner(snapshot: &ReadSnapshot, identity: &str, format: AddressFormat) -> bool {
    snapshot
        .owner
        .as_deref()
        .is_some_and(|owner| format.same_identity(owner, identity))
}
