//! Sui network configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Sui network types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiNetwork {
    /// Sui mainnet
    Mainnet,
    /// Sui testnet
    Testnet,
    /// Sui devnet
    Devnet,
    /// Local Sui network
    Local,
}

impl SuiNetwork {
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            SuiNetwork::Mainnet => "https://fullnode.mainnet.sui.io:443",
            SuiNetwork::Testnet => "https://fullnode.testnet.sui.io:443",
            SuiNetwork::Devnet => "https://fullnode.devnet.sui.io:443",
            SuiNetwork::Local => "http://127.0.0.1:9000",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuiNetwork::Mainnet => "mainnet",
            SuiNetwork::Testnet => "testnet",
            SuiNetwork::Devnet => "devnet",
            SuiNetwork::Local => "local",
        }
    }
}

impl fmt::Display for SuiNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuiNetwork {
    type Err = SuiConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(SuiNetwork::Mainnet),
            "testnet" => Ok(SuiNetwork::Testnet),
            "devnet" => Ok(SuiNetwork::Devnet),
            "local" | "localnet" => Ok(SuiNetwork::Local),
            other => Err(SuiConfigError::UnknownNetwork(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuiConfigError {
    #[error("unknown Sui network {0}; expected mainnet, testnet, devnet or local")]
    UnknownNetwork(String),

    #[error("invalid RPC URL format: {0}")]
    InvalidRpcUrl(String),

    #[error("gas budget must be greater than 0")]
    ZeroGasBudget,
}

/// Sui-specific settings for the token adapter.
#[derive(Debug, Clone)]
pub struct SuiConfig {
    /// Sui network to connect to
    pub network: SuiNetwork,

    /// Custom RPC endpoint URL (overrides network default)
    pub rpc_url: Option<String>,

    /// Gas budget for transactions (in MIST)
    pub gas_budget: u64,

    /// Delay between `sui_getTransactionBlock` polls
    pub poll_interval: Duration,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl SuiConfig {
    pub fn new(network: SuiNetwork) -> Self {
        Self {
            network,
            rpc_url: None,
            gas_budget: 100_000_000, // 0.1 SUI
            poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Set custom RPC URL.
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set gas budget.
    pub fn with_gas_budget(mut self, budget: u64) -> Self {
        self.gas_budget = budget;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Get the RPC URL (custom or default for network).
    pub fn get_rpc_url(&self) -> &str {
        self.rpc_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_rpc_url())
    }

    pub fn validate(&self) -> Result<(), SuiConfigError> {
        let url = self.get_rpc_url();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(SuiConfigError::InvalidRpcUrl(url.to_string()));
        }
        if self.gas_budget == 0 {
            return Err(SuiConfigError::ZeroGasBudget);
        }
        Ok(())
    }
}

impl Default for SuiConfig {
    fn default() -> Self {
        Self::new(SuiNetwork::Testnet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_url_overrides_network_default() {
        let config = SuiConfig::new(SuiNetwork::Testnet);
        assert_eq!(config.get_rpc_url(), "https://fullnode.testnet.sui.io:443");
        let config = config.with_rpc_url("http://127.0.0.1:9123");
        assert_eq!(config.get_rpc_url(), "http://127.0.0.1:9123");
    }

    #[test]
    fn validation() {
        assert!(SuiConfig::default().validate().is_ok());
        assert_eq!(
            SuiConfig::default().with_gas_budget(0).validate(),
            Err(SuiConfigError::ZeroGasBudget)
        );
        assert!(matches!(
            SuiConfig::default().with_rpc_url("ws://x").validate(),
            Err(SuiConfigError::InvalidRpcUrl(_))
        ));
    }

    #[test]
    fn network_names() {
        assert_eq!("Testnet".parse::<SuiNetwork>().unwrap(), SuiNetwork::Testnet);
        assert!("moon".parse::<SuiNetwork>().is_err());
    }
}
