//! Wallet backed by a node or signer exposing `eth_accounts`/`eth_sendTransaction`.

use std::time::Duration;

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::TransactionRequest;

use client_blockchain_core::{SignRequest, TxId, Wallet, WalletError};

use crate::abi;

/// EIP-1193 code for a declined request.
const USER_REJECTED: i64 = 4001;

pub struct RpcWallet {
    provider: Provider<Http>,
    request_timeout: Duration,
}

impl RpcWallet {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, WalletError> {
        let provider = Provider::<Http>::try_from(endpoint)
            .map_err(|e| WalletError::Other(format!("{endpoint}: {e}")))?;
        Ok(Self {
            provider,
            request_timeout,
        })
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, WalletError>
    where
        F: std::future::Future<Output = Result<T, ProviderError>>,
    {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(|_| WalletError::Other(format!("wallet did not answer within {:?}", self.request_timeout)))?
            .map_err(wallet_error)
    }
}

fn wallet_error(err: ProviderError) -> WalletError {
    match err.as_error_response() {
        Some(response) if response.code == USER_REJECTED => WalletError::Rejected,
        Some(response) => WalletError::Other(response.message.clone()),
        None => WalletError::Other(err.to_string()),
    }
}

/// Network name for an EVM chain id.
pub fn network_name(chain_id: u128) -> String {
    match chain_id {
        1 => "mainnet".to_string(),
        11_155_111 => "sepolia".to_string(),
        43_113 => "fuji".to_string(),
        43_114 => "avalanche".to_string(),
        31_337 => "localhost".to_string(),
        other => format!("chain-{other}"),
    }
}

#[async_trait]
impl Wallet for RpcWallet {
    fn name(&self) -> &str {
        "json-rpc"
    }

    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        let accounts = self.bounded(self.provider.get_accounts()).await?;
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts.iter().map(abi::format_address).collect())
    }

    async fn network(&self) -> Result<String, WalletError> {
        let chain_id = self.bounded(self.provider.get_chainid()).await?;
        let id = abi::to_u128(chain_id).map_err(|e| WalletError::Other(e.to_string()))?;
        Ok(network_name(id))
    }

    async fn sign_and_submit(&self, request: SignRequest) -> Result<TxId, WalletError> {
        let tx: TransactionRequest = serde_json::from_value(request.payload)
            .map_err(|e| WalletError::Other(format!("malformed transaction: {e}")))?;
        let pending = self.bounded(self.provider.send_transaction(tx, None)).await?;
        let hash = format!("{:#x}", pending.tx_hash());
        tracing::info!(%hash, "transaction broadcast");
        Ok(TxId(hash))
    }
}
