//! Conversions between `sui-sdk` types and core types.
//!
//! ## Conversion Categories
//!
//! 1. **Identifiers**: object ids and account addresses
//! 2. **Objects**: Move struct fields rendered as JSON
//! 3. **Effects**: execution status to finality status

use serde_json::Value;
use sui_sdk::rpc_types::{SuiExecutionStatus, SuiParsedData};
use sui_sdk::types::base_types::{ObjectID, SuiAddress};

use client_blockchain_core::{DispatchError, FinalityStatus, TransportError};

// ============================================================================
// Identifiers
// ============================================================================

/// Parses an object or package id, accepting short forms like `0x2`.
pub fn parse_object_id(id: &str) -> Result<ObjectID, TransportError> {
    ObjectID::from_hex_literal(id).map_err(|e| TransportError::Decode(format!("object id {id}: {e}")))
}

pub fn parse_address(address: &str) -> Result<SuiAddress, TransportError> {
    parse_object_id(address)
        .map(SuiAddress::from)
        .map_err(|_| TransportError::Decode(format!("invalid Sui address {address}")))
}

// ============================================================================
// Object Fields
// ============================================================================

/// Move struct fields of an object fetched with content.
pub fn move_fields(content: Option<SuiParsedData>) -> Result<Value, TransportError> {
    match content {
        Some(SuiParsedData::MoveObject(object)) => Ok(object.fields.to_json_value()),
        Some(SuiParsedData::Package(_)) => Err(TransportError::Decode(
            "expected a Move object, found a package".into(),
        )),
        None => Err(TransportError::Decode("object has no Move fields".into())),
    }
}

/// Reads an integer field. Sui renders `u64` as strings and `Balance<T>` either
/// as a plain value or as a nested struct holding `value`.
pub fn field_u128(fields: &Value, name: &str) -> Result<u128, TransportError> {
    let value = fields
        .get(name)
        .ok_or_else(|| TransportError::Decode(format!("missing field {name}")))?;
    value_u128(value).ok_or_else(|| TransportError::Decode(format!("field {name} is not an integer: {value}")))
}

fn value_u128(value: &Value) -> Option<u128> {
    match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64().map(u128::from),
        Value::Object(_) => value
            .pointer("/fields/value")
            .or_else(|| value.get("value"))
            .and_then(value_u128),
        _ => None,
    }
}

pub fn field_string(fields: &Value, name: &str) -> Result<String, TransportError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TransportError::Decode(format!("missing string field {name}")))
}

/// Sums the `balance` field over holder objects, skipping entries without one.
pub fn sum_balances<I>(objects: I) -> Result<u128, TransportError>
where
    I: IntoIterator<Item = Value>,
{
    objects.into_iter().try_fold(0u128, |total, fields| {
        let Ok(balance) = field_u128(&fields, "balance") else {
            return Ok(total);
        };
        total
            .checked_add(balance)
            .ok_or_else(|| TransportError::Decode("balance sum overflows".into()))
    })
}

// ============================================================================
// Effects
// ============================================================================

pub fn execution_status(status: &SuiExecutionStatus, emitted_events: usize) -> FinalityStatus {
    match status {
        SuiExecutionStatus::Success => FinalityStatus::Finalized { emitted_events },
        SuiExecutionStatus::Failure { error } => {
            FinalityStatus::Failed(DispatchError::Reverted(error.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn short_ids_are_padded() {
        let id = parse_object_id("0x2").unwrap();
        assert_eq!(id.to_string(), format!("0x{:0>64}", "2"));
        assert!(parse_object_id(&format!("0x{}", "00".repeat(33))).is_err());
        assert!(parse_address("0xuser").is_err());
    }

    #[test]
    fn treasury_fields() {
        let fields = json!({
            "owner": "0xabc",
            "total_supply": "5000",
            "balance": "20000000"
        });
        assert_eq!(field_string(&fields, "owner").unwrap(), "0xabc");
        assert_eq!(field_u128(&fields, "total_supply").unwrap(), 5000);
        assert_eq!(field_u128(&fields, "balance").unwrap(), 20_000_000);
        assert!(field_u128(&fields, "missing").is_err());
    }

    #[test]
    fn nested_balance_struct() {
        let fields = json!({"balance": {"type": "0x2::balance::Balance<0x2::sui::SUI>", "fields": {"value": "7"}}});
        assert_eq!(field_u128(&fields, "balance").unwrap(), 7);
        assert_eq!(field_u128(&json!({"balance": {"value": "9"}}), "balance").unwrap(), 9);
    }

    #[test]
    fn missing_content_is_error() {
        assert!(move_fields(None).is_err());
    }

    #[test]
    fn holder_balances_are_summed() {
        let objects = vec![
            json!({"balance": "1000"}),
            json!({"balance": "500"}),
            json!({"id": "0xdeleted"}),
        ];
        assert_eq!(sum_balances(objects).unwrap(), 1500);
        assert_eq!(sum_balances(Vec::new()).unwrap(), 0);

        let overflow = vec![json!({"balance": u128::MAX.to_string()}), json!({"balance": "1"})];
        assert!(sum_balances(overflow).is_err());
    }

    #[test]
    fn effects_to_finality() {
        assert_eq!(
            execution_status(&SuiExecutionStatus::Success, 1),
            FinalityStatus::Finalized { emitted_events: 1 }
        );
        assert_eq!(
            execution_status(
                &SuiExecutionStatus::Failure {
                    error: "MoveAbort(..., 1) in command 1".into()
                },
                0
            ),
            FinalityStatus::Failed(DispatchError::Reverted("MoveAbort(..., 1) in command 1".into()))
        );
    }
}
