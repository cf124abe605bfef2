//! Sui `ChainTransport` on the `sui-sdk` read API.
//!
//! The token keeps its state in a shared treasury object (owner, total supply,
//! collected SUI) and per-holder `IABSBalance` objects, so reads are object
//! queries rather than view calls.

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Value, json};
use sui_sdk::rpc_types::{
    SuiObjectDataFilter, SuiObjectDataOptions, SuiObjectResponseQuery,
    SuiTransactionBlockEffectsAPI, SuiTransactionBlockResponseOptions,
};
use sui_sdk::types::digests::TransactionDigest;
use sui_sdk::types::parse_sui_struct_tag;
use sui_sdk::{SuiClient, SuiClientBuilder};
use tokio::sync::OnceCell;

use client_blockchain_core::{
    CallArg, ChainTransport, ContractCall, ContractHandle, Finality, FinalityStatus, PendingTx,
    ReadValue, SignRequest, TransportError, Wallet, poll_finality,
};
use token_core::TxKind;

use crate::config::SuiConfig;
use crate::utils::conversion;

const OWNED_OBJECTS_PAGE: usize = 50;

/// Sui adapter.
pub struct SuiTransport {
    config: SuiConfig,
    client: OnceCell<SuiClient>,
}

impl SuiTransport {
    pub fn new(config: SuiConfig) -> Result<Self, TransportError> {
        config
            .validate()
            .map_err(|e| TransportError::Config(e.to_string()))?;
        Ok(Self {
            config,
            client: OnceCell::new(),
        })
    }

    async fn client(&self) -> Result<&SuiClient, TransportError> {
        self.client
            .get_or_try_init(|| async {
                let url = self.config.get_rpc_url();
                tracing::debug!(%url, "connecting to Sui fullnode");
                SuiClientBuilder::default()
                    .request_timeout(self.config.request_timeout)
                    .build(url)
                    .await
                    .map_err(|e| TransportError::Network(format!("{url}: {e}")))
            })
            .await
    }

    /// Move fields of a shared or owned object.
    async fn object_fields(&self, object_id: &str) -> Result<Value, TransportError> {
        let id = conversion::parse_object_id(object_id)?;
        let response = self
            .client()
            .await?
            .read_api()
            .get_object_with_options(id, SuiObjectDataOptions::new().with_content())
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let object = response
            .into_object()
            .map_err(|e| TransportError::NotDeployed(format!("object {object_id}: {e}")))?;
        conversion::move_fields(object.content)
    }

    async fn treasury_field(&self, handle: &ContractHandle, field: &str) -> Result<ReadValue, TransportError> {
        let fields = self
            .object_fields(treasury_id(handle)?)
            .await
            .map_err(|e| read_failure(field, e))?;
        if field == handle.methods().owner {
            conversion::field_string(&fields, field).map(ReadValue::Identity)
        } else {
            conversion::field_u128(&fields, field).map(ReadValue::Integer)
        }
    }

    async fn owned_balance(&self, handle: &ContractHandle, owner: &str) -> Result<u128, TransportError> {
        let method = handle.methods().balance_of.as_str();
        let owner = conversion::parse_address(owner)?;
        let tag = parse_sui_struct_tag(&balance_struct_type(handle))
            .map_err(|e| TransportError::Config(format!("balance type: {e}")))?;
        let query = SuiObjectResponseQuery::new(
            Some(SuiObjectDataFilter::StructType(tag)),
            Some(SuiObjectDataOptions::new().with_content()),
        );

        let read_api = self.client().await?.read_api();
        let mut cursor = None;
        let mut total: u128 = 0;
        loop {
            let page = read_api
                .get_owned_objects(owner, Some(query.clone()), cursor, Some(OWNED_OBJECTS_PAGE))
                .await
                .map_err(|e| read_failure(method, TransportError::Backend(e.to_string())))?;

            let holdings = page
                .data
                .into_iter()
                .filter_map(|entry| entry.data)
                .filter_map(|object| conversion::move_fields(object.content).ok());
            total = total
                .checked_add(conversion::sum_balances(holdings)?)
                .ok_or_else(|| TransportError::Decode("balance sum overflows".into()))?;

            match page.next_cursor {
                Some(next) if page.has_next_page => cursor = Some(next),
                _ => return Ok(total),
            }
        }
    }
}

fn treasury_id(handle: &ContractHandle) -> Result<&str, TransportError> {
    handle
        .interface
        .state_object
        .as_deref()
        .ok_or_else(|| TransportError::Config("Sui deployment needs a treasury object id".into()))
}

fn module_name(handle: &ContractHandle) -> &str {
    handle.interface.module.as_deref().unwrap_or("iabs")
}

/// `<package>::<module>::<balance struct>` filter for the holder's balance objects.
pub fn balance_struct_type(handle: &ContractHandle) -> String {
    format!(
        "{}::{}::{}",
        handle.contract,
        module_name(handle),
        handle.methods().balance_of
    )
}

/// Describes the programmable transaction for the wallet to build and sign.
///
/// Mint splits the payment off the gas coin and passes it with the treasury;
/// withdraw only takes the treasury.
pub fn move_call_request(
    handle: &ContractHandle,
    call: &ContractCall,
    gas_budget: u64,
) -> Result<Value, TransportError> {
    let treasury = treasury_id(handle)?;
    let target = format!("{}::{}::{}", handle.contract, module_name(handle), call.method);
    let arguments = match call.kind {
        TxKind::Mint => json!([
            { "Object": treasury },
            { "SplitGas": call.payment.to_string() }
        ]),
        TxKind::Withdraw => json!([{ "Object": treasury }]),
    };
    Ok(json!({
        "kind": "moveCall",
        "sender": handle.identity,
        "target": target,
        "arguments": arguments,
        "gasBudget": gas_budget.to_string(),
    }))
}

fn read_failure(method: &str, err: TransportError) -> TransportError {
    match err {
        TransportError::Backend(reason) | TransportError::NotDeployed(reason) => {
            TransportError::ReadFailed {
                method: method.to_string(),
                reason,
            }
        }
        other => other,
    }
}

/// Fullnodes answer unknown digests with an error until the transaction is indexed.
fn is_not_found(message: &str) -> bool {
    message.contains("Could not find")
}

#[async_trait]
impl ChainTransport for SuiTransport {
    fn name(&self) -> &str {
        "sui"
    }

    async fn probe(&self, handle: &ContractHandle) -> Result<(), TransportError> {
        let package = conversion::parse_object_id(handle.contract.as_str())?;
        let response = self
            .client()
            .await?
            .read_api()
            .get_object_with_options(package, SuiObjectDataOptions::new())
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        if response.data.is_none() {
            return Err(TransportError::NotDeployed(format!(
                "package {} not found on {}",
                handle.contract, self.config.network
            )));
        }

        self.object_fields(treasury_id(handle)?).await.map_err(|e| {
            TransportError::NotDeployed(format!("treasury object unavailable: {e}"))
        })?;
        Ok(())
    }

    async fn read(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[CallArg],
    ) -> Result<ReadValue, TransportError> {
        if method == handle.methods().balance_of {
            let owner = match args.first() {
                Some(CallArg::Identity(owner)) => owner.as_str(),
                _ => handle.identity.as_str(),
            };
            return self.owned_balance(handle, owner).await.map(ReadValue::Integer);
        }
        self.treasury_field(handle, method).await
    }

    async fn submit(
        &self,
        handle: &ContractHandle,
        call: &ContractCall,
        wallet: &dyn Wallet,
    ) -> Result<PendingTx, TransportError> {
        let payload = move_call_request(handle, call, self.config.gas_budget)?;
        tracing::debug!(kind = %call.kind, package = %handle.contract, "submitting sui move call");
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
        let digest = TransactionDigest::from_str(pending.id.as_str())
            .map_err(|e| TransportError::Decode(format!("transaction digest {}: {e}", pending.id)))?;
        let client = self.client().await?.clone();
        Ok(Finality::Awaited(poll_finality(self.config.poll_interval, move || {
            let client = client.clone();
            async move {
                let options = SuiTransactionBlockResponseOptions::new()
                    .with_effects()
                    .with_events();
                let block = match client
                    .read_api()
                    .get_transaction_with_options(digest, options)
                    .await
                {
                    Ok(block) => block,
                    Err(err) if is_not_found(&err.to_string()) => return Ok(FinalityStatus::Pending),
                    Err(err) => return Err(TransportError::Finality(err.to_string())),
                };
                let Some(effects) = block.effects else {
                    return Ok(FinalityStatus::Pending);
                };
                let emitted = block.events.map_or(0, |events| events.data.len());
                Ok(conversion::execution_status(effects.status(), emitted))
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use client_blockchain_core::{ContractId, InterfaceDescriptor, MethodNames, NetworkEndpoint};
    use token_core::Chain;

    use super::*;

    fn handle() -> ContractHandle {
        ContractHandle {
            endpoint: NetworkEndpoint {
                network: "testnet".into(),
                url: "https://fullnode.testnet.sui.io:443".into(),
            },
            contract: ContractId::new("0xd595"),
            interface: InterfaceDescriptor {
                chain: Chain::Sui,
                module: Some("iabs".into()),
                state_object: Some("0x26fd".into()),
                methods: MethodNames {
                    mint: "mint".into(),
                    withdraw: "withdraw".into(),
                    owner: "owner".into(),
                    total_supply: "total_supply".into(),
                    contract_balance: "balance".into(),
                    balance_of: "IABSBalance".into(),
                    mint_price: None,
                },
            },
            identity: "0xuser".into(),
            generation: 1,
        }
    }

    #[test]
    fn mint_splits_payment_from_gas() {
        let call = ContractCall {
            kind: TxKind::Mint,
            method: "mint".into(),
            payment: 10_000_000,
            amount: None,
        };
        let request = move_call_request(&handle(), &call, 100).unwrap();
        assert_eq!(request["target"], "0xd595::iabs::mint");
        assert_eq!(request["arguments"][0]["Object"], "0x26fd");
        assert_eq!(request["arguments"][1]["SplitGas"], "10000000");
        assert_eq!(request["sender"], "0xuser");
    }

    #[test]
    fn withdraw_passes_only_treasury() {
        let call = ContractCall {
            kind: TxKind::Withdraw,
            method: "withdraw".into(),
            payment: 0,
            amount: Some(1),
        };
        let request = move_call_request(&handle(), &call, 100).unwrap();
        assert_eq!(request["arguments"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn balance_filter_names_package_type() {
        assert_eq!(balance_struct_type(&handle()), "0xd595::iabs::IABSBalance");
    }

    #[test]
    fn missing_treasury_is_config_error() {
        let mut handle = handle();
        handle.interface.state_object = None;
        assert!(matches!(treasury_id(&handle), Err(TransportError::Config(_))));
    }

    #[test]
    fn unindexed_transaction_is_pending() {
        assert!(is_not_found("Could not find the referenced transaction [TransactionDigest(..)]"));
        assert!(!is_not_found("request timed out"));
    }

    #[test]
    fn object_errors_become_read_failures() {
        let err = read_failure("owner", TransportError::NotDeployed("object 0x26fd: deleted".into()));
        assert_eq!(
            err,
            TransportError::ReadFailed {
                method: "owner".into(),
                reason: "object 0x26fd: deleted".into()
            }
        );
        assert!(matches!(
            read_failure("owner", TransportError::Decode("x".into())),
            TransportError::Decode(_)
        ));
    }

    #[test]
    fn building_the_transport_stays_offline() {
        let config = SuiConfig::new(crate::config::SuiNetwork::Local);
        let transport = SuiTransport::new(config).unwrap();
        assert!(transport.client.get().is_none());
    }

    #[tokio::test]
    async fn malformed_digest_is_rejected_before_polling() {
        let transport = SuiTransport::new(SuiConfig::new(crate::config::SuiNetwork::Local)).unwrap();
        let pending = PendingTx {
            id: client_blockchain_core::TxId::new("not-a-digest!"),
            kind: TxKind::Mint,
        };
        let err = transport.finality(&handle(), &pending).await.unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
