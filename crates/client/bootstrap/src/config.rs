//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use client_blockchain_core::InterfaceDescriptor;
use runtime::SessionConfig;
use token_core::{Chain, ContractConfig, to_base_units};
use url::Url;

use crate::presets::{Preset, preset};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} has invalid value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid endpoint {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid contract configuration: {0}")]
    Contract(String),
}

/// Configuration required to bootstrap a session and console front-end.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub contract: ContractConfig,
    pub interface: InterfaceDescriptor,
    pub session: SessionConfig,
    /// Delay between finality polls.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Account to connect as; defaults to the wallet's first account.
    pub identity: Option<String>,
    /// JSON-RPC endpoint of the signing wallet (EVM only); defaults to the RPC URL.
    pub wallet_url: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Preset for `chain` with default tuning.
    pub fn for_chain(chain: Chain) -> Self {
        let Preset {
            contract,
            interface,
        } = preset(chain);
        Self {
            contract,
            interface,
            session: SessionConfig::default(),
            poll_interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            identity: None,
            wallet_url: None,
            log_dir: None,
        }
    }

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `IABS_CHAIN` - Chain preset to start from (required)
    /// - `IABS_RPC_URL` - Node endpoint (default: preset)
    /// - `IABS_CONTRACT_ID` - Contract address or package id (default: preset)
    /// - `IABS_MODULE` - Move module name (default: preset)
    /// - `IABS_STATE_OBJECT` - Shared state object id, Sui only (default: preset)
    /// - `IABS_EXPLORER_URL` - Transaction explorer prefix (default: preset)
    /// - `IABS_MINT_PRICE` - Mint price in native units, e.g. `0.01` (default: preset)
    /// - `IABS_FINALITY_TIMEOUT_SECS` - Finality wait limit (default: 60)
    /// - `IABS_POLL_INTERVAL_MS` - Finality poll interval (default: 2000)
    /// - `IABS_EVENT_BUFFER` - Event bus capacity per topic (default: 100)
    /// - `IABS_IDENTITY` - Account to connect as
    /// - `IABS_WALLET_URL` - Signing wallet JSON-RPC endpoint (default: RPC URL)
    /// - `IABS_LOG_DIR` - Log directory (default: platform cache directory)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let chain_name = read("IABS_CHAIN").ok_or(ConfigError::Missing("IABS_CHAIN"))?;
        let chain: Chain = chain_name
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "IABS_CHAIN",
                value: chain_name.clone(),
                reason: "unknown chain".to_string(),
            })?;
        let mut config = Self::for_chain(chain);

        if let Some(url) = read("IABS_RPC_URL") {
            config.contract.rpc_url = url;
        }
        if let Some(id) = read("IABS_CONTRACT_ID") {
            config.contract.contract_id = id;
        }
        if let Some(module) = read("IABS_MODULE") {
            config.contract.module = Some(module.clone());
            config.interface.module = Some(module);
        }
        if let Some(object) = read("IABS_STATE_OBJECT") {
            config.contract.state_object = Some(object.clone());
            config.interface.state_object = Some(object);
        }
        if let Some(explorer) = read("IABS_EXPLORER_URL") {
            config.contract.explorer_url = Some(explorer);
        }
        if let Some(price) = read("IABS_MINT_PRICE") {
            config.contract.mint_price = to_base_units(&price, config.contract.native_decimals)
                .map_err(|e| ConfigError::InvalidValue {
                    key: "IABS_MINT_PRICE",
                    value: price.clone(),
                    reason: e.to_string(),
                })?;
        }

        if let Some(secs) = read_env::<u64>(&read, "IABS_FINALITY_TIMEOUT_SECS")? {
            config.session.finality_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = read_env::<u64>(&read, "IABS_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms.max(10));
        }
        if let Some(capacity) = read_env::<usize>(&read, "IABS_EVENT_BUFFER")? {
            config.session.event_buffer_size = capacity.max(1);
        }

        config.identity = read("IABS_IDENTITY");
        config.wallet_url = read("IABS_WALLET_URL");
        config.log_dir = read("IABS_LOG_DIR").map(PathBuf::from);

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_endpoint(&self.contract.rpc_url)?;
        if let Some(url) = &self.wallet_url {
            check_endpoint(url)?;
        }
        self.contract
            .check_amounts()
            .map_err(ConfigError::Contract)
    }
}

fn check_endpoint(url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" | "ws" | "wss" => Ok(()),
        other => Err(ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn read_env<T>(
    read: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    read(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key,
                    value: value.clone(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}
