//! Public runtime API surface.

pub mod errors;

pub use errors::{ResolveError, Result, SessionError};
