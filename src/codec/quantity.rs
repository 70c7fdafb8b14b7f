//! Hex quantities, byte data, and block revision identifiers.
//!
//! # Responsibilities
//! - Encode unsigned integers as minimal-length `0x` hex quantities
//! - Decode quantities from hex strings, JSON numbers, or raw byte strings
//! - Encode/decode variable-length byte data (`0x`, even nibble count)
//! - Normalize Ethereum block identifiers into backend revisions

use alloy::primitives::ruint::UintTryFrom;
use alloy::primitives::U256;
use serde_json::Value;
use thiserror::Error;

/// Errors produced by the pure conversion layer.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed hex or numeric input. The client's fault.
    #[error("malformed hex input: {0}")]
    InvalidHex(String),

    /// The backend returned a shape this gateway does not understand.
    #[error("unexpected backend shape: {0}")]
    Schema(String),
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Encode an unsigned integer as a minimal-length `0x` hex quantity.
///
/// Zero encodes as `0x0`; no other value carries a leading zero nibble.
pub fn encode_quantity<T>(value: T) -> String
where
    U256: UintTryFrom<T>,
{
    let value: U256 = U256::from(value);
    format!("0x{value:x}")
}

/// Decode a quantity from a JSON value.
///
/// Accepts a JSON integer, a `0x`-prefixed hex string, or a raw big-endian
/// byte string (some backend fields arrive as raw integers).
pub fn decode_quantity(value: &Value) -> CodecResult<U256> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| CodecError::InvalidHex(format!("non-integer quantity: {n}"))),
        Value::String(s) => {
            if let Some(digits) = s.strip_prefix("0x") {
                U256::from_str_radix(digits, 16)
                    .map_err(|_| CodecError::InvalidHex(format!("bad hex quantity: {s}")))
            } else {
                // Raw big-endian byte string.
                let bytes = s.as_bytes();
                if bytes.len() > 32 {
                    return Err(CodecError::InvalidHex(format!(
                        "byte quantity longer than 32 bytes: {} bytes",
                        bytes.len()
                    )));
                }
                Ok(U256::from_be_slice(bytes))
            }
        }
        other => Err(CodecError::InvalidHex(format!(
            "unsupported quantity encoding: {other}"
        ))),
    }
}

/// Decode a quantity that must fit in a `u64`.
pub fn decode_quantity_u64(value: &Value) -> CodecResult<u64> {
    let wide = decode_quantity(value)?;
    u64::try_from(wide).map_err(|_| CodecError::InvalidHex(format!("quantity overflows u64: {wide}")))
}

/// Decode `0x`-prefixed (or bare) hex into bytes.
///
/// Odd nibble counts and non-hex characters are rejected.
pub fn decode_hex(input: &str) -> CodecResult<Vec<u8>> {
    let digits = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(digits).map_err(|e| CodecError::InvalidHex(format!("{input:?}: {e}")))
}

/// Encode bytes as `0x`-prefixed hex. Empty payloads encode as `0x`.
pub fn encode_bytes(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Left-pad a storage position to the backend's fixed 64-hex-digit key form.
pub fn pad_storage_key(position: &str) -> String {
    let digits = position.strip_prefix("0x").unwrap_or(position);
    format!("0x{digits:0>64}")
}

/// A backend block revision: the best block, a block number, or a block id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// The current best (latest) block.
    Best,
    /// A block height.
    Number(u64),
    /// A full 32-byte block id, `0x`-prefixed.
    Id(String),
}

impl Revision {
    /// Normalize an optional Ethereum block identifier parameter.
    ///
    /// `"latest"`/`"pending"`/`"best"`/absent map to the best block,
    /// `"earliest"` to height zero, 66-character `0x` strings are block ids,
    /// and anything else is decoded as a quantity.
    pub fn from_identifier(identifier: Option<&Value>) -> CodecResult<Self> {
        let Some(identifier) = identifier else {
            return Ok(Revision::Best);
        };
        match identifier {
            Value::Null => Ok(Revision::Number(0)),
            Value::Number(_) => Ok(Revision::Number(decode_quantity_u64(identifier)?)),
            Value::String(s) => match s.as_str() {
                "best" | "latest" | "pending" => Ok(Revision::Best),
                "earliest" => Ok(Revision::Number(0)),
                s if s.len() == 66 && s.starts_with("0x") => Ok(Revision::Id(s.to_string())),
                _ => Ok(Revision::Number(decode_quantity_u64(identifier)?)),
            },
            other => Err(CodecError::InvalidHex(format!(
                "unsupported block identifier: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Revision::Best => f.write_str("best"),
            Revision::Number(n) => write!(f, "{n}"),
            Revision::Id(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantity_round_trip() {
        for n in [0u64, 1, 15, 16, 255, 256, 100, u64::MAX] {
            let encoded = encode_quantity(n);
            let decoded = decode_quantity(&json!(encoded)).unwrap();
            assert_eq!(decoded, U256::from(n), "round trip for {n}");
        }
    }

    #[test]
    fn zero_encodes_as_0x0() {
        assert_eq!(encode_quantity(0u64), "0x0");
    }

    #[test]
    fn no_leading_zero_nibbles() {
        assert_eq!(encode_quantity(255u64), "0xff");
        assert_eq!(encode_quantity(256u64), "0x100");
        assert_eq!(encode_quantity(100u64), "0x64");
    }

    #[test]
    fn decodes_json_numbers() {
        assert_eq!(decode_quantity(&json!(42)).unwrap(), U256::from(42u64));
    }

    #[test]
    fn decodes_raw_byte_strings_big_endian() {
        // A one-byte string decodes as its byte value.
        assert_eq!(decode_quantity(&json!("\u{01}")).unwrap(), U256::from(1u64));
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(decode_quantity(&json!("0xzz")).is_err());
        assert!(decode_hex("0x123").is_err());
        assert!(decode_hex("0xgg").is_err());
    }

    #[test]
    fn byte_data_round_trip() {
        assert_eq!(encode_bytes(&[]), "0x");
        assert_eq!(encode_bytes(&[0, 255]), "0x00ff");
        assert_eq!(decode_hex("0x00ff").unwrap(), vec![0, 255]);
        assert_eq!(decode_hex("0x").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn storage_key_is_zero_padded() {
        let padded = pad_storage_key("1");
        assert_eq!(padded.len(), 66);
        assert!(padded.ends_with('1'));
        assert_eq!(pad_storage_key("0x1"), padded);
    }

    #[test]
    fn revision_normalization() {
        assert_eq!(Revision::from_identifier(None).unwrap(), Revision::Best);
        assert_eq!(
            Revision::from_identifier(Some(&json!("latest"))).unwrap(),
            Revision::Best
        );
        assert_eq!(
            Revision::from_identifier(Some(&json!("earliest"))).unwrap(),
            Revision::Number(0)
        );
        assert_eq!(
            Revision::from_identifier(Some(&json!("0x64"))).unwrap(),
            Revision::Number(100)
        );
        let id = format!("0x{}", "ab".repeat(32));
        assert_eq!(
            Revision::from_identifier(Some(&json!(id))).unwrap(),
            Revision::Id(id.clone())
        );
        assert_eq!(Revision::Number(100).to_string(), "100");
        assert_eq!(Revision::Best.to_string(), "best");
    }
}
