//! `ChainTransport` for EVM chains on an `ethers` HTTP provider.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::Detokenize;
use ethers::contract::{BaseContract, Contract, ContractError};
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::types::{Address, TransactionReceipt, TransactionRequest, TxHash, U256};

use client_blockchain_core::{
    CallArg, ChainTransport, ContractCall, ContractHandle, DispatchError, Finality,
    FinalityStatus, NATIVE_BALANCE, PendingTx, ReadValue, SignRequest, TransportError, Wallet,
    poll_finality,
};

use crate::abi;

type HttpProvider = Provider<Http>;

/// EVM adapter. Views go through the token ABI, finality by polling receipts.
pub struct EvmTransport {
    provider: Arc<HttpProvider>,
    contract: BaseContract,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl EvmTransport {
    pub fn new(rpc_url: &str, poll_interval: Duration, request_timeout: Duration) -> Result<Self, TransportError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| TransportError::Config(format!("{rpc_url}: {e}")))?
            .interval(poll_interval);
        Ok(Self {
            provider: Arc::new(provider),
            contract: abi::token_contract()?,
            poll_interval,
            request_timeout,
        })
    }

    fn bind(&self, handle: &ContractHandle) -> Result<Contract<HttpProvider>, TransportError> {
        let address = abi::parse_address(handle.contract.as_str())?;
        Ok(Contract::new(
            address,
            self.contract.clone(),
            Arc::clone(&self.provider),
        ))
    }

    async fn view<D>(&self, handle: &ContractHandle, method: &str, args: &[CallArg]) -> Result<D, TransportError>
    where
        D: Detokenize + Send + Sync,
    {
        let contract = self.bind(handle)?;
        let call = match args {
            [] => contract.method::<_, D>(method, ()),
            [CallArg::Identity(account)] => contract.method::<_, D>(method, abi::parse_address(account)?),
            [CallArg::Amount(amount)] => contract.method::<_, D>(method, U256::from(*amount)),
            _ => {
                return Err(TransportError::Config(format!(
                    "{method} takes at most one argument"
                )));
            }
        }
        .map_err(|e| TransportError::Config(format!("{method}: {e}")))?;

        bounded(self.request_timeout, call.call())
            .await?
            .map_err(|e| read_failure(method, e))
    }
}

/// Caps a provider call; the provider's own client carries no deadline.
async fn bounded<F: Future>(limit: Duration, call: F) -> Result<F::Output, TransportError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| TransportError::Network(format!("request timed out after {limit:?}")))
}

pub(crate) fn provider_error(err: ProviderError) -> TransportError {
    match err.as_error_response() {
        Some(response) => TransportError::Backend(response.message.clone()),
        None => TransportError::Network(err.to_string()),
    }
}

/// Builds the transaction the wallet signs for a contract call.
pub fn transaction_request(
    contract: &BaseContract,
    handle: &ContractHandle,
    call: &ContractCall,
) -> Result<TransactionRequest, TransportError> {
    let data = contract
        .encode(call.method.as_str(), ())
        .map_err(|e| TransportError::Config(format!("{}: {e}", call.method)))?;
    Ok(TransactionRequest::new()
        .from(abi::parse_address(&handle.identity)?)
        .to(abi::parse_address(handle.contract.as_str())?)
        .data(data)
        .value(U256::from(call.payment)))
}

/// Interprets a receipt lookup; `None` means the node has not mined it yet.
pub fn receipt_status(receipt: Option<&TransactionReceipt>) -> Result<FinalityStatus, TransportError> {
    let Some(receipt) = receipt else {
        return Ok(FinalityStatus::Pending);
    };
    let status = receipt
        .status
        .ok_or_else(|| TransportError::Decode("receipt has no status".into()))?;

    match status.as_u64() {
        1 => Ok(FinalityStatus::Finalized {
            emitted_events: receipt.logs.len(),
        }),
        _ => Ok(FinalityStatus::Failed(DispatchError::Reverted(
            "transaction reverted".into(),
        ))),
    }
}

fn read_failure(method: &str, err: ContractError<HttpProvider>) -> TransportError {
    let reason = err
        .decode_revert::<String>()
        .or_else(|| {
            err.as_middleware_error()
                .and_then(|e| e.as_error_response())
                .map(|response| response.message.clone())
        })
        .unwrap_or_else(|| err.to_string());
    TransportError::ReadFailed {
        method: method.to_string(),
        reason,
    }
}

#[async_trait]
impl ChainTransport for EvmTransport {
    fn name(&self) -> &str {
        "evm"
    }

    async fn probe(&self, handle: &ContractHandle) -> Result<(), TransportError> {
        let address = abi::parse_address(handle.contract.as_str())?;
        let code = bounded(self.request_timeout, self.provider.get_code(address, None))
            .await?
            .map_err(provider_error)?;
        if code.as_ref().is_empty() {
            return Err(TransportError::NotDeployed(format!(
                "no code at {} on {}",
                handle.contract, handle.endpoint.network
            )));
        }
        Ok(())
    }

    async fn read(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[CallArg],
    ) -> Result<ReadValue, TransportError> {
        if method == NATIVE_BALANCE {
            let address = abi::parse_address(handle.contract.as_str())?;
            let balance = bounded(self.request_timeout, self.provider.get_balance(address, None))
                .await?
                .map_err(|e| TransportError::ReadFailed {
                    method: method.to_string(),
                    reason: provider_error(e).to_string(),
                })?;
            return abi::to_u128(balance).map(ReadValue::Integer);
        }

        if method == handle.methods().owner {
            let owner: Address = self.view(handle, method, args).await?;
            Ok(ReadValue::Identity(abi::format_address(&owner)))
        } else {
            let value: U256 = self.view(handle, method, args).await?;
            abi::to_u128(value).map(ReadValue::Integer)
        }
    }

    async fn submit(
        &self,
        handle: &ContractHandle,
        call: &ContractCall,
        wallet: &dyn Wallet,
    ) -> Result<PendingTx, TransportError> {
        let tx = transaction_request(&self.contract, handle, call)?;
        let payload = serde_json::to_value(&tx)
            .map_err(|e| TransportError::Decode(format!("transaction request: {e}")))?;
        tracing::debug!(kind = %call.kind, contract = %handle.contract, "submitting evm transaction");
        let id = wallet
            .sign_and_submit(SignRequest {
                chain: handle.chain(),
                payload,
            })
            .await?;
        Ok(PendingTx {
            id,
            kind: call.kind,
        })
    }

    async fn finality(
        &self,
        _handle: &ContractHandle,
        pending: &PendingTx,
    ) -> Result<Finality, TransportError> {
        let hash = TxHash::from_str(pending.id.as_str())
            .map_err(|e| TransportError::Decode(format!("transaction hash {}: {e}", pending.id)))?;
        let provider = Arc::clone(&self.provider);
        let limit = self.request_timeout;
        Ok(Finality::Awaited(poll_finality(self.poll_interval, move || {
            let provider = Arc::clone(&provider);
            async move {
                let receipt = bounded(limit, provider.get_transaction_receipt(hash))
                    .await?
                    .map_err(|e| TransportError::Finality(e.to_string()))?;
                receipt_status(receipt.as_ref())
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use client_blockchain_core::{ContractId, InterfaceDescriptor, MethodNames, NetworkEndpoint};
    use ethers::abi::{Token, encode};
    use ethers::providers::{HttpClientError, JsonRpcError};
    use ethers::types::{Bytes, Log};
    use token_core::{Chain, TxKind};

    use super::*;

    fn handle() -> ContractHandle {
        ContractHandle {
            endpoint: NetworkEndpoint {
                network: "sepolia".into(),
                url: "https://rpc.sepolia.org".into(),
            },
            contract: ContractId::new("0xFFbC7A0F639a89bA6914a8D356769853C41AD52B"),
            interface: InterfaceDescriptor {
                chain: Chain::Ethereum,
                module: None,
                state_object: None,
                methods: MethodNames {
                    mint: "mint".into(),
                    withdraw: "withdraw".into(),
                    owner: "owner".into(),
                    total_supply: "totalSupply".into(),
                    contract_balance: NATIVE_BALANCE.into(),
                    balance_of: "balanceOf".into(),
                    mint_price: None,
                },
            },
            identity: "0x5b38da6a701c568545dcfcb03fcb875f56beddc4".into(),
            generation: 1,
        }
    }

    fn payload(call: &ContractCall) -> serde_json::Value {
        let contract = abi::token_contract().unwrap();
        let tx = transaction_request(&contract, &handle(), call).unwrap();
        serde_json::to_value(tx).unwrap()
    }

    #[test]
    fn mint_attaches_payment_as_value() {
        let tx = payload(&ContractCall {
            kind: TxKind::Mint,
            method: "mint".into(),
            payment: 10u128.pow(16),
            amount: None,
        });
        assert_eq!(tx["data"], "0x1249c58b");
        assert_eq!(tx["value"], "0x2386f26fc10000");
        assert_eq!(tx["from"], "0x5b38da6a701c568545dcfcb03fcb875f56beddc4");
        assert_eq!(tx["to"], "0xffbc7a0f639a89ba6914a8d356769853c41ad52b");
    }

    #[test]
    fn withdraw_ignores_amount() {
        let tx = payload(&ContractCall {
            kind: TxKind::Withdraw,
            method: "withdraw".into(),
            payment: 0,
            amount: Some(5),
        });
        assert_eq!(tx["data"], "0x3ccfd60b");
        assert_eq!(tx["value"], "0x0");
    }

    #[test]
    fn payload_survives_the_wallet_round_trip() {
        let tx = payload(&ContractCall {
            kind: TxKind::Mint,
            method: "mint".into(),
            payment: 7,
            amount: None,
        });
        let decoded: TransactionRequest = serde_json::from_value(tx).unwrap();
        assert_eq!(decoded.value, Some(U256::from(7u64)));
    }

    #[test]
    fn unknown_method_is_a_config_error() {
        let contract = abi::token_contract().unwrap();
        let call = ContractCall {
            kind: TxKind::Mint,
            method: "mintTo".into(),
            payment: 0,
            amount: None,
        };
        assert!(matches!(
            transaction_request(&contract, &handle(), &call),
            Err(TransportError::Config(_))
        ));
    }

    #[test]
    fn receipts_map_to_finality() {
        assert_eq!(receipt_status(None).unwrap(), FinalityStatus::Pending);

        let mined = TransactionReceipt {
            status: Some(1u64.into()),
            logs: vec![Log::default(), Log::default()],
            ..Default::default()
        };
        assert_eq!(
            receipt_status(Some(&mined)).unwrap(),
            FinalityStatus::Finalized { emitted_events: 2 }
        );

        let reverted = TransactionReceipt {
            status: Some(0u64.into()),
            ..Default::default()
        };
        assert_eq!(
            receipt_status(Some(&reverted)).unwrap(),
            FinalityStatus::Failed(DispatchError::Reverted("transaction reverted".into()))
        );

        assert!(receipt_status(Some(&TransactionReceipt::default())).is_err());
    }

    #[test]
    fn read_failure_prefers_revert_reason() {
        let mut data = ethers::utils::id("Error(string)").to_vec();
        data.extend(encode(&[Token::String("Ownable: caller is not the owner".into())]));
        let err = read_failure("owner", ContractError::Revert(Bytes::from(data)));
        assert_eq!(
            err,
            TransportError::ReadFailed {
                method: "owner".into(),
                reason: "Ownable: caller is not the owner".into()
            }
        );
    }

    #[test]
    fn node_errors_keep_their_message() {
        let rpc = ProviderError::from(HttpClientError::JsonRpcError(JsonRpcError {
            code: -32000,
            message: "header not found".into(),
            data: None,
        }));
        assert_eq!(
            provider_error(rpc),
            TransportError::Backend("header not found".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_calls_time_out() {
        let err = bounded(Duration::from_secs(1), tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(msg) if msg.contains("timed out")));
    }

    #[test]
    fn rejects_malformed_endpoints() {
        let err = EvmTransport::new("not a url", Duration::from_secs(1), Duration::from_secs(1)).err();
        assert!(matches!(err, Some(TransportError::Config(_))));
    }
}
