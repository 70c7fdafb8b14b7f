//! Backend request/response payloads and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::codec::topics::TopicSet;
use crate::codec::quantity::decode_quantity_u64;
use crate::codec::{decode_hex, decode_quantity, CodecError};
use crate::keystore::KeystoreError;
use alloy::primitives::U256;

/// Errors raised while talking to the backend node.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused or timed out. Never retried for writes.
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    /// The backend answered with a non-success status; its message text is
    /// preserved for the caller.
    #[error("backend rejected request: {0}")]
    Rejected(String),

    /// A dry-run reported the call as reverted.
    #[error("execution reverted: {0}")]
    Reverted(String),

    /// The backend answered with a shape this gateway does not understand.
    #[error("unexpected backend shape: {0}")]
    Schema(String),

    /// The requested filter id is not registered (or was uninstalled).
    #[error("filter not found: {0}")]
    FilterNotFound(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Keystore(#[from] KeystoreError),

    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

impl From<reqwest::Error> for BackendError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            BackendError::Unavailable(error.to_string())
        } else if error.is_decode() {
            BackendError::Schema(error.to_string())
        } else {
            BackendError::Unavailable(error.to_string())
        }
    }
}

/// An Ethereum-shaped transaction object as received over JSON-RPC.
///
/// Numeric fields arrive as hex quantities or JSON integers; `to` is absent
/// for contract creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EthTransaction {
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: Option<Value>,
    pub gas: Option<Value>,
    pub data: Option<String>,
}

impl EthTransaction {
    /// Transfer value, defaulting to zero.
    pub fn value(&self) -> Result<U256, CodecError> {
        match &self.value {
            Some(value) => decode_quantity(value),
            None => Ok(U256::ZERO),
        }
    }

    /// Requested gas limit, if any.
    pub fn gas_limit(&self) -> Result<Option<u64>, CodecError> {
        match &self.gas {
            Some(gas) => decode_quantity_u64(gas).map(Some),
            None => Ok(None),
        }
    }

    /// Call data as a hex string, defaulting to empty.
    pub fn data_hex(&self) -> &str {
        self.data.as_deref().unwrap_or("0x")
    }

    /// Call data as bytes.
    pub fn data_bytes(&self) -> Result<Vec<u8>, CodecError> {
        decode_hex(self.data_hex())
    }

    /// Whether this transaction creates a contract (no `to` address).
    pub fn creates_contract(&self) -> bool {
        self.to.is_none()
    }
}

/// Body of a dry-run call against the account simulate resource.
#[derive(Debug, Serialize)]
pub struct SimulateRequest {
    pub data: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
}

/// Result of a dry-run call.
#[derive(Debug, Deserialize)]
pub struct SimulateResult {
    #[serde(default)]
    pub data: String,
    #[serde(rename = "gasUsed", default)]
    pub gas_used: u64,
    #[serde(default)]
    pub reverted: bool,
    #[serde(rename = "vmError", default)]
    pub vm_error: String,
}

/// Body of a raw transaction submission.
#[derive(Debug, Serialize)]
pub struct RawTxRequest {
    pub raw: String,
}

/// Block range of an event query, in block units.
#[derive(Debug, Serialize)]
pub struct EventRange {
    pub unit: &'static str,
    pub from: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

/// Body of an event (log) query.
#[derive(Debug, Serialize)]
pub struct EventQuery {
    pub range: EventRange,
    #[serde(rename = "topicSets")]
    pub topic_sets: Vec<TopicSet>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transaction_defaults() {
        let tx = EthTransaction::default();
        assert_eq!(tx.value().unwrap(), U256::ZERO);
        assert_eq!(tx.gas_limit().unwrap(), None);
        assert_eq!(tx.data_hex(), "0x");
        assert!(tx.creates_contract());
    }

    #[test]
    fn transaction_accepts_hex_and_numeric_fields() {
        let tx: EthTransaction = serde_json::from_value(json!({
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": "0x0000000000000000000000000000000000000001",
            "value": "0x64",
            "gas": 30_000,
            "data": "0x00ff",
        }))
        .unwrap();
        assert_eq!(tx.value().unwrap(), U256::from(100u64));
        assert_eq!(tx.gas_limit().unwrap(), Some(30_000));
        assert_eq!(tx.data_bytes().unwrap(), vec![0x00, 0xff]);
        assert!(!tx.creates_contract());
    }

    #[test]
    fn event_query_serializes_backend_field_names() {
        let query = EventQuery {
            range: EventRange {
                unit: "block",
                from: 5,
                to: None,
            },
            topic_sets: Vec::new(),
        };
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["range"]["unit"], json!("block"));
        assert_eq!(json["range"]["from"], json!(5));
        assert!(json["range"].get("to").is_none());
        assert_eq!(json["topicSets"], json!([]));
    }
}
