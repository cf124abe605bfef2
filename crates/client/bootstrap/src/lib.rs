//! Shared bootstrap utilities for client front-ends.
//!
//! Provides configuration loading, per-chain presets, logging setup and
//! session assembly that any front-end can reuse.
pub mod builder;
pub mod config;
pub mod logging;
pub mod presets;

pub use builder::{SessionAssembler, SessionSetup};
pub use config::{ClientConfig, ConfigError};
pub use logging::setup_logging;
pub use presets::{CONTRACT_PLACEHOLDER, Preset, preset};
