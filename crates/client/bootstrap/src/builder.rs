//! Builds the chain adapter, wallet and session used by front-ends.
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use client_blockchain_aptos::AptosTransport;
use client_blockchain_core::{ChainTransport, ReadOnlyWallet, Wallet};
use client_blockchain_evm::{EvmTransport, RpcWallet};
use client_blockchain_sui::{SuiConfig, SuiNetwork, SuiTransport};
use runtime::Session;
use token_core::Chain;

use crate::config::ClientConfig;

/// Builder that assembles the transport, wallet and session for clients.
pub struct SessionAssembler {
    config: ClientConfig,
    transport: Option<Arc<dyn ChainTransport>>,
    wallet: Option<Arc<dyn Wallet>>,
}

impl SessionAssembler {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            wallet: None,
        }
    }

    /// Use a custom transport instead of the chain's built-in adapter.
    pub fn transport(mut self, transport: Arc<dyn ChainTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a custom wallet instead of the chain's default.
    pub fn wallet(mut self, wallet: Arc<dyn Wallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn build(self) -> Result<SessionSetup> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => transport_for(&self.config)?,
        };
        let wallet = match self.wallet {
            Some(wallet) => wallet,
            None => wallet_for(&self.config)?,
        };

        let session = Session::builder()
            .config(self.config.session.clone())
            .contract(self.config.contract.clone())
            .interface(self.config.interface.clone())
            .transport(Arc::clone(&transport))
            .build()
            .context("building session")?;

        tracing::info!(
            chain = %self.config.contract.chain,
            network = %self.config.contract.network,
            transport = transport.name(),
            wallet = wallet.name(),
            "session assembled"
        );

        Ok(SessionSetup {
            config: self.config,
            session: Arc::new(session),
            wallet,
        })
    }
}

pub struct SessionSetup {
    pub config: ClientConfig,
    pub session: Arc<Session>,
    pub wallet: Arc<dyn Wallet>,
}

fn transport_for(config: &ClientConfig) -> Result<Arc<dyn ChainTransport>> {
    let contract = &config.contract;
    let transport: Arc<dyn ChainTransport> = match contract.chain {
        Chain::Ethereum | Chain::Avalanche => Arc::new(EvmTransport::new(
            &contract.rpc_url,
            config.poll_interval,
            config.request_timeout,
        )?),
        Chain::Aptos => Arc::new(AptosTransport::new(
            &contract.rpc_url,
            config.poll_interval,
            config.request_timeout,
        )?),
        Chain::Sui => {
            let network: SuiNetwork = contract
                .network
                .parse()
                .with_context(|| format!("Sui network {:?}", contract.network))?;
            let sui = SuiConfig::new(network)
                .with_rpc_url(contract.rpc_url.clone())
                .with_poll_interval(config.poll_interval)
                .with_request_timeout(config.request_timeout);
            Arc::new(SuiTransport::new(sui)?)
        }
        Chain::Near | Chain::Solana | Chain::Polkadot | Chain::Injective => bail!(
            "no adapter for {}; supported chains are ethereum, avalanche, aptos and sui",
            contract.chain
        ),
    };
    Ok(transport)
}

fn wallet_for(config: &ClientConfig) -> Result<Arc<dyn Wallet>> {
    let contract = &config.contract;
    if contract.chain.is_evm() {
        let endpoint = config.wallet_url.as_deref().unwrap_or(&contract.rpc_url);
        let wallet = RpcWallet::new(endpoint, config.request_timeout)
            .with_context(|| format!("connecting wallet at {endpoint}"))?;
        return Ok(Arc::new(wallet));
    }

    let identity = config
        .identity
        .clone()
        .with_context(|| format!("IABS_IDENTITY is required for {}", contract.chain))?;
    Ok(Arc::new(ReadOnlyWallet::new(identity, contract.network.clone())))
}
