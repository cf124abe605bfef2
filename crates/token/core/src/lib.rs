//! Pure domain types for the IABS token client.
//!
//! Everything here is synchronous and free of I/O: unit conversion, identity
//! normalization, the read snapshot, transaction attempt states and the static
//! contract configuration. Chain access lives in `client-blockchain-core` and
//! orchestration in `runtime`.

pub mod actions;
pub mod attempt;
pub mod config;
pub mod identity;
pub mod ownership;
pub mod snapshot;
pub mod units;

pub use actions::available_actions;
pub use attempt::{AttemptId, TxAttempt, TxFailure, TxKind, TxStatus};
pub use config::{Chain, ContractConfig};
pub use identity::{AddressFormat, IdentityError, IdentityKey};
pub use ownership::is_owner;
pub use snapshot::{ReadField, ReadSnapshot};
pub use units::{
    Amount, MAX_DECIMALS, UnitError, format_fixed, scale_factor, to_base_units, to_human, to_plain,
};
