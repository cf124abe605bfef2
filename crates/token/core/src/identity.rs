//! Address encodings and normalization to raw key bytes.
//!
//! Several target chains accept more than one textual spelling of the same
//! account (mixed-case hex, short Move addresses, SS58 under different network
//! prefixes). Identities are therefore compared after decoding, never as text.

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SS58_CONTEXT: &[u8] = b"SS58PRE";
const SS58_CHECKSUM_LEN: usize = 2;
const SS58_KEY_LEN: usize = 32;

/// Textual encoding used by a chain for account identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressFormat {
    /// Hex with optional `0x` prefix, case-insensitive, left-padded to `width` bytes.
    Hex { width: usize },
    /// Substrate SS58 with a one or two byte network prefix.
    Ss58,
    /// Plain base58 public key of `width` bytes.
    Base58 { width: usize },
    /// Human-readable account id, compared case-insensitively.
    AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity is empty")]
    Empty,

    #[error("invalid hex identity {input:?}: {reason}")]
    Hex { input: String, reason: String },

    #[error("invalid base58 identity {input:?}: {reason}")]
    Base58 { input: String, reason: String },

    #[error("identity {input:?} decodes to {len} bytes, expected {expected}")]
    Length {
        input: String,
        len: usize,
        expected: usize,
    },

    #[error("unsupported SS58 layout for {input:?}")]
    Ss58Layout { input: String },

    #[error("SS58 checksum mismatch for {0:?}")]
    Checksum(String),
}

/// Normalized identity: the raw bytes every valid spelling decodes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey(Vec<u8>);

impl IdentityKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AddressFormat {
    /// Decode `identity` into its normalized key bytes.
    pub fn normalize(&self, identity: &str) -> Result<IdentityKey, IdentityError> {
        let text = identity.trim();
        if text.is_empty() {
            return Err(IdentityError::Empty);
        }

        match *self {
            AddressFormat::Hex { width } => decode_hex(text, width),
            AddressFormat::Ss58 => decode_ss58(text),
            AddressFormat::Base58 { width } => {
                let bytes = decode_base58(text)?;
                if bytes.len() != width {
                    return Err(IdentityError::Length {
                        input: text.to_string(),
                        len: bytes.len(),
                        expected: width,
                    });
                }
                Ok(IdentityKey(bytes))
            }
            AddressFormat::AccountId => Ok(IdentityKey(text.to_lowercase().into_bytes())),
        }
    }

    /// True when both spellings decode to the same key. Undecodable input never matches.
    pub fn same_identity(&self, a: &str, b: &str) -> bool {
        match (self.normalize(a), self.normalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Whether `identity` is all-zero bytes (an undeployed contract slot).
    pub fn is_zero(&self, identity: &str) -> bool {
        match self {
            AddressFormat::AccountId => false,
            _ => self
                .normalize(identity)
                .is_ok_and(|key| key.as_bytes().iter().all(|b| *b == 0)),
        }
    }
}

fn decode_hex(text: &str, width: usize) -> Result<IdentityKey, IdentityError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if digits.is_empty() {
        return Err(IdentityError::Empty);
    }

    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded).map_err(|e| IdentityError::Hex {
        input: text.to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() > width {
        return Err(IdentityError::Length {
            input: text.to_string(),
            len: bytes.len(),
            expected: width,
        });
    }

    let mut key = vec![0u8; width - bytes.len()];
    key.extend_from_slice(&bytes);
    Ok(IdentityKey(key))
}

fn decode_base58(text: &str) -> Result<Vec<u8>, IdentityError> {
    bs58::decode(text)
        .into_vec()
        .map_err(|e| IdentityError::Base58 {
            input: text.to_string(),
            reason: e.to_string(),
        })
}

fn decode_ss58(text: &str) -> Result<IdentityKey, IdentityError> {
    let data = decode_base58(text)?;
    let layout_error = || IdentityError::Ss58Layout {
        input: text.to_string(),
    };

    // Prefixes 0..=63 take one byte, 64..=16383 take two with bit 6 set on the first.
    let prefix_len = match data.first() {
        Some(b) if *b < 64 => 1,
        Some(b) if *b < 128 => 2,
        _ => return Err(layout_error()),
    };
    if data.len() != prefix_len + SS58_KEY_LEN + SS58_CHECKSUM_LEN {
        return Err(layout_error());
    }

    let (payload, checksum) = data.split_at(data.len() - SS58_CHECKSUM_LEN);
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_CONTEXT);
    hasher.update(payload);
    let digest = hasher.finalize();
    if digest[..SS58_CHECKSUM_LEN] != *checksum {
        return Err(IdentityError::Checksum(text.to_string()));
    }

    Ok(IdentityKey(payload[prefix_len..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_GENERIC: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_POLKADOT: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";
    const BOB_GENERIC: &str = "5FHneW46xGXgs5mUiveU4sbTyGBzmstUspZC92UhjJM694ty";
    const ALICE_KEY: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    #[test]
    fn ss58_prefixes_decode_to_same_key() {
        let generic = AddressFormat::Ss58.normalize(ALICE_GENERIC).unwrap();
        let polkadot = AddressFormat::Ss58.normalize(ALICE_POLKADOT).unwrap();
        assert_eq!(generic.to_hex(), ALICE_KEY);
        assert_eq!(generic, polkadot);
        assert!(!AddressFormat::Ss58.same_identity(ALICE_GENERIC, BOB_GENERIC));
    }

    #[test]
    fn ss58_rejects_corrupted_checksum() {
        let mut corrupted = ALICE_GENERIC.to_string();
        corrupted.pop();
        corrupted.push('Z');
        assert!(AddressFormat::Ss58.normalize(&corrupted).is_err());
        assert!(!AddressFormat::Ss58.same_identity(&corrupted, ALICE_GENERIC));
    }

    #[test]
    fn evm_hex_is_case_insensitive() {
        let format = AddressFormat::Hex { width: 20 };
        assert!(format.same_identity(
            "0x5B38Da6a701c568545dCfcB03FcB875f56beddC4",
            "0x5b38da6a701c568545dcfcb03fcb875f56beddc4",
        ));
        assert!(format.same_identity(
            "5b38da6a701c568545dcfcb03fcb875f56beddc4",
            "0x5b38da6a701c568545dcfcb03fcb875f56beddc4",
        ));
    }

    #[test]
    fn move_short_addresses_are_padded() {
        let format = AddressFormat::Hex { width: 32 };
        let full = format!("0x{}1", "0".repeat(63));
        assert!(format.same_identity("0x1", &full));
        assert!(format.is_zero("0x0"));
        assert!(!format.is_zero("0x1"));
    }

    #[test]
    fn hex_wider_than_address_is_rejected() {
        let format = AddressFormat::Hex { width: 20 };
        let err = format.normalize(&format!("0x{}", "ab".repeat(21))).unwrap_err();
        assert!(matches!(err, IdentityError::Length { len: 21, expected: 20, .. }));
    }

    #[test]
    fn base58_checks_width() {
        let format = AddressFormat::Base58 { width: 32 };
        let system = format.normalize("11111111111111111111111111111111").unwrap();
        assert_eq!(system.as_bytes(), &[0u8; 32]);
        assert!(matches!(
            format.normalize("1111"),
            Err(IdentityError::Length { len: 4, .. })
        ));
        assert!(format.normalize("0OIl").is_err());
    }

    #[test]
    fn account_ids_ignore_case() {
        let format = AddressFormat::AccountId;
        assert!(format.same_identity("Alice.Testnet", "alice.testnet"));
        assert!(!format.same_identity("alice.testnet", "bob.testnet"));
        assert!(!format.same_identity("", ""));
    }
}
