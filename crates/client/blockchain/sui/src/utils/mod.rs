//! Utility modules for Sui blockchain integration.
//!
//! ## Modules
//!
//! - [`conversion`]: identifiers, Move object fields and execution status

pub mod conversion;

pub use conversion::{execution_status, move_fields, parse_address, parse_object_id};
