//! `ChainTransport` for Aptos: view functions, entry function payloads and
//! transaction-by-hash polling.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use client_blockchain_core::{
    CallArg, ChainTransport, ContractCall, ContractHandle, DispatchError, Finality,
    FinalityStatus, PendingTx, ReadValue, SignRequest, TransportError, Wallet, poll_finality,
};
use token_core::TxKind;

use crate::rest::{Lookup, RestClient};

pub struct AptosTransport {
    rest: RestClient,
    poll_interval: Duration,
}

impl AptosTransport {
    pub fn new(node_url: &str, poll_interval: Duration, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            rest: RestClient::new(node_url, timeout)?,
            poll_interval,
        })
    }
}

fn module_name(handle: &ContractHandle) -> Result<&str, TransportError> {
    handle
        .interface
        .module
        .as_deref()
        .ok_or_else(|| TransportError::Config("Aptos deployment needs a module name".into()))
}

/// Fully qualified `<address>::<module>::<function>`.
pub fn function_id(handle: &ContractHandle, function: &str) -> Result<String, TransportError> {
    Ok(format!("{}::{}::{function}", handle.contract, module_name(handle)?))
}

/// Body for `POST /view`. Integers travel as decimal strings.
pub fn view_request(handle: &ContractHandle, function: &str, args: &[CallArg]) -> Result<Value, TransportError> {
    let arguments: Vec<Value> = args
        .iter()
        .map(|arg| match arg {
            CallArg::Identity(address) => json!(address),
            CallArg::Amount(value) => json!(value.to_string()),
        })
        .collect();
    Ok(json!({
        "function": function_id(handle, function)?,
        "type_arguments": [],
        "arguments": arguments,
    }))
}

/// First element of a view response as an identity or integer.
pub fn decode_view(function: &str, response: &Value, expect_identity: bool) -> Result<ReadValue, TransportError> {
    let first = response
        .as_array()
        .and_then(|values| values.first())
        .ok_or_else(|| TransportError::Decode(format!("{function} returned no values")))?;

    if expect_identity {
        return first
            .as_str()
            .map(|s| ReadValue::Identity(s.to_string()))
            .ok_or_else(|| TransportError::Decode(format!("{function} did not return an address")));
    }

    let parsed = match first {
        Value::String(s) => s.parse::<u128>().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        _ => None,
    };
    parsed
        .map(ReadValue::Integer)
        .ok_or_else(|| TransportError::Decode(format!("{function} returned {first}, not an integer")))
}

/// Entry function payload for the wallet. Mint takes the payment in octas,
/// withdraw takes the amount to withdraw.
pub fn entry_function_payload(handle: &ContractHandle, call: &ContractCall) -> Result<Value, TransportError> {
    let argument = match call.kind {
        TxKind::Mint => call.payment,
        TxKind::Withdraw => call
            .amount
            .ok_or_else(|| TransportError::Rejected("withdraw amount required".into()))?,
    };
    Ok(json!({
        "function": function_id(handle, &call.method)?,
        "typeArguments": [],
        "functionArguments": [argument.to_string()],
    }))
}

/// Interprets `GET /transactions/by_hash/{hash}`.
pub fn transaction_status(lookup: &Lookup) -> FinalityStatus {
    let Lookup::Found(tx) = lookup else {
        return FinalityStatus::Pending;
    };
    if tx.get("type").and_then(Value::as_str) == Some("pending_transaction") {
        return FinalityStatus::Pending;
    }
    match tx.get("success").and_then(Value::as_bool) {
        Some(true) => FinalityStatus::Finalized {
            emitted_events: tx
                .get("events")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
        },
        Some(false) => FinalityStatus::Failed(DispatchError::Reverted(
            tx.get("vm_status")
                .and_then(Value::as_str)
                .unwrap_or("transaction failed")
                .to_string(),
        )),
        None => FinalityStatus::Pending,
    }
}

#[async_trait]
impl ChainTransport for AptosTransport {
    fn name(&self) -> &str {
        "aptos"
    }

    async fn probe(&self, handle: &ContractHandle) -> Result<(), TransportError> {
        let path = format!(
            "accounts/{}/module/{}",
            handle.contract,
            module_name(handle)?
        );
        match self.rest.get(&path).await? {
            Lookup::Found(_) => Ok(()),
            Lookup::NotFound => Err(TransportError::NotDeployed(format!(
                "module {}::{} not published on {}",
                handle.contract,
                module_name(handle)?,
                handle.endpoint.network
            ))),
        }
    }

    async fn read(
        &self,
        handle: &ContractHandle,
        method: &str,
        args: &[CallArg],
    ) -> Result<ReadValue, TransportError> {
        let body = view_request(handle, method, args)?;
        let response = self.rest.post("view", &body).await.map_err(|e| match e {
            TransportError::Backend(reason) => TransportError::ReadFailed {
                method: method.to_string(),
                reason,
            },
            other => other,
        })?;
        decode_view(method, &response, method == handle.methods().owner)
    }

    async fn submit(
        &self,
        handle: &ContractHandle,
        call: &ContractCall,
        wallet: &dyn Wallet,
    ) -> Result<PendingTx, TransportError> {
        let payload = entry_function_payload(handle, call)?;
        tracing::debug!(kind = %call.kind, module = %handle.contract, "submitting aptos entry function");
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
        let rest = self.rest.clone();
        let path = format!("transactions/by_hash/{}", pending.id);
        Ok(Finality::Awaited(poll_finality(self.poll_interval, move || {
            let rest = rest.clone();
            let path = path.clone();
            async move {
                let lookup = rest
                    .get(&path)
                    .await
                    .map_err(|e| TransportError::Finality(e.to_string()))?;
                Ok(transaction_status(&lookup))
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use client_blockchain_core::{ContractId, InterfaceDescriptor, MethodNames, NetworkEndpoint};
    use token_core::Chain;

    use super::*;

    const MODULE_ADDR: &str = "0x66da5deaafe9b7bc30c67c3fe3044c7d1af12a5477fa2cfb830f370232ceb9ea";

    fn handle() -> ContractHandle {
        ContractHandle {
            endpoint: NetworkEndpoint {
                network: "testnet".into(),
                url: "https://fullnode.testnet.aptoslabs.com/v1".into(),
            },
            contract: ContractId::new(MODULE_ADDR),
            interface: InterfaceDescriptor {
                chain: Chain::Aptos,
                module: Some("IABS".into()),
                state_object: None,
                methods: MethodNames {
                    mint: "mint".into(),
                    withdraw: "withdraw".into(),
                    owner: "get_owner".into(),
                    total_supply: "get_total_supply".into(),
                    contract_balance: "get_contract_balance".into(),
                    balance_of: "balance_of".into(),
                    mint_price: None,
                },
            },
            identity: "0x1".into(),
            generation: 1,
        }
    }

    #[test]
    fn view_body_uses_qualified_function() {
        let body = view_request(&handle(), "balance_of", &[CallArg::Identity("0x1".into())]).unwrap();
        assert_eq!(body["function"], format!("{MODULE_ADDR}::IABS::balance_of"));
        assert_eq!(body["arguments"][0], "0x1");
    }

    #[test]
    fn view_results_decode() {
        assert_eq!(
            decode_view("get_total_supply", &json!(["500000000000"]), false).unwrap(),
            ReadValue::Integer(500_000_000_000)
        );
        assert_eq!(
            decode_view("get_owner", &json!(["0xabc"]), true).unwrap(),
            ReadValue::Identity("0xabc".into())
        );
        assert!(decode_view("get_total_supply", &json!([]), false).is_err());
        assert!(decode_view("get_total_supply", &json!([true]), false).is_err());
    }

    #[test]
    fn mint_and_withdraw_arguments() {
        let mint = ContractCall {
            kind: TxKind::Mint,
            method: "mint".into(),
            payment: 1_000_000,
            amount: None,
        };
        let payload = entry_function_payload(&handle(), &mint).unwrap();
        assert_eq!(payload["functionArguments"], json!(["1000000"]));

        let withdraw = ContractCall {
            kind: TxKind::Withdraw,
            method: "withdraw".into(),
            payment: 0,
            amount: Some(2_500_000),
        };
        let payload = entry_function_payload(&handle(), &withdraw).unwrap();
        assert_eq!(payload["function"], format!("{MODULE_ADDR}::IABS::withdraw"));
        assert_eq!(payload["functionArguments"], json!(["2500000"]));

        let without_amount = ContractCall { amount: None, ..withdraw };
        assert!(entry_function_payload(&handle(), &without_amount).is_err());
    }

    #[test]
    fn transaction_lookup_states() {
        assert_eq!(transaction_status(&Lookup::NotFound), FinalityStatus::Pending);
        assert_eq!(
            transaction_status(&Lookup::Found(json!({"type": "pending_transaction"}))),
            FinalityStatus::Pending
        );
        assert_eq!(
            transaction_status(&Lookup::Found(json!({
                "type": "user_transaction", "success": true, "events": [{}, {}, {}]
            }))),
            FinalityStatus::Finalized { emitted_events: 3 }
        );
        assert_eq!(
            transaction_status(&Lookup::Found(json!({
                "type": "user_transaction", "success": false,
                "vm_status": "Move abort in 0x66da::IABS: E_NOT_OWNER(0x1)"
            }))),
            FinalityStatus::Failed(DispatchError::Reverted(
                "Move abort in 0x66da::IABS: E_NOT_OWNER(0x1)".into()
            ))
        );
    }
}
