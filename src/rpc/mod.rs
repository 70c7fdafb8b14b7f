//! JSON-RPC 2.0 types, error codes, and method dispatch.
//!
//! Each supported method has one handler that normalizes parameters through
//! the codec, delegates to the backend client, and shapes the result. The
//! dispatch table is a plain match over the full method name.

pub mod eth;
pub mod misc;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::backend::types::BackendError;
use crate::backend::BackendClient;
use crate::codec::CodecError;
use crate::keystore::KeystoreError;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct RpcContext {
    pub client: Arc<BackendClient>,
    pub client_version: String,
}

/// Error type for JSON-RPC method failures.
///
/// Each variant maps to a JSON-RPC error code:
/// - `-32601`: method not found
/// - `-32602`: invalid/missing params (client's fault)
/// - `-32603`: internal error (including backend shape surprises)
/// - `-32010`: backend unreachable, distinct so clients can tell "node
///   down" from "bad request"
/// - `-32000`: request rejected (revert, submission failure, unknown
///   filter or account); the backend's message text is preserved
#[derive(Debug, Error)]
pub enum RpcErr {
    #[error("method not found: {0}")]
    MethodNotFound(String),
    #[error("invalid params: {0}")]
    BadParams(String),
    #[error("missing parameter: {0}")]
    MissingParam(&'static str),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("execution reverted: {0}")]
    Reverted(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("filter not found: {0}")]
    FilterNotFound(String),
    #[error("unknown account: {0}")]
    UnknownAccount(String),
}

impl From<BackendError> for RpcErr {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Unavailable(message) => RpcErr::BackendUnavailable(message),
            BackendError::Rejected(message) => RpcErr::Rejected(message),
            BackendError::Reverted(message) => RpcErr::Reverted(message),
            BackendError::Schema(message) => RpcErr::Internal(message),
            BackendError::FilterNotFound(id) => RpcErr::FilterNotFound(id),
            BackendError::Codec(codec) => codec.into(),
            BackendError::Keystore(KeystoreError::UnknownAccount(address)) => {
                RpcErr::UnknownAccount(address)
            }
            BackendError::Keystore(other) => RpcErr::Internal(other.to_string()),
            BackendError::InvalidEndpoint(error) => RpcErr::Internal(error.to_string()),
        }
    }
}

impl From<CodecError> for RpcErr {
    fn from(error: CodecError) -> Self {
        match error {
            CodecError::InvalidHex(message) => RpcErr::BadParams(message),
            CodecError::Schema(message) => RpcErr::Internal(message),
        }
    }
}

impl From<serde_json::Error> for RpcErr {
    fn from(error: serde_json::Error) -> Self {
        RpcErr::BadParams(error.to_string())
    }
}

/// JSON-RPC request identifier; numbers and strings both occur in the wild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcRequestId {
    Number(u64),
    String(String),
}

/// A parsed JSON-RPC 2.0 request.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcRequest {
    pub id: RpcRequestId,
    pub jsonrpc: String,
    pub method: String,
    pub params: Option<Vec<Value>>,
}

/// Error metadata of a JSON-RPC error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcErrorMetadata {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub message: String,
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcSuccessResponse {
    pub id: RpcRequestId,
    pub jsonrpc: String,
    pub result: Value,
}

/// An error JSON-RPC 2.0 response.
#[derive(Debug, Serialize, Deserialize)]
pub struct RpcErrorResponse {
    pub id: RpcRequestId,
    pub jsonrpc: String,
    pub error: RpcErrorMetadata,
}

impl From<RpcErr> for RpcErrorMetadata {
    fn from(error: RpcErr) -> Self {
        let code = match &error {
            RpcErr::MethodNotFound(_) => -32601,
            RpcErr::BadParams(_) | RpcErr::MissingParam(_) => -32602,
            RpcErr::Internal(_) => -32603,
            RpcErr::BackendUnavailable(_) => -32010,
            RpcErr::Reverted(_)
            | RpcErr::Rejected(_)
            | RpcErr::FilterNotFound(_)
            | RpcErr::UnknownAccount(_) => -32000,
        };
        RpcErrorMetadata {
            code,
            data: None,
            message: error.to_string(),
        }
    }
}

/// Wrap a handler result into a complete JSON-RPC 2.0 response value.
pub fn rpc_response(id: RpcRequestId, result: Result<Value, RpcErr>) -> Value {
    match result {
        Ok(result) => serde_json::json!(RpcSuccessResponse {
            id,
            jsonrpc: "2.0".to_string(),
            result,
        }),
        Err(error) => serde_json::json!(RpcErrorResponse {
            id,
            jsonrpc: "2.0".to_string(),
            error: error.into(),
        }),
    }
}

/// Fetch a positional parameter.
pub(crate) fn param<'p>(params: &'p Option<Vec<Value>>, index: usize) -> Option<&'p Value> {
    params.as_ref().and_then(|params| params.get(index))
}

/// Fetch a required positional parameter.
pub(crate) fn require<'p>(
    params: &'p Option<Vec<Value>>,
    index: usize,
    name: &'static str,
) -> Result<&'p Value, RpcErr> {
    param(params, index).ok_or(RpcErr::MissingParam(name))
}

/// Fetch a required string parameter.
pub(crate) fn require_str<'p>(
    params: &'p Option<Vec<Value>>,
    index: usize,
    name: &'static str,
) -> Result<&'p str, RpcErr> {
    require(params, index, name)?
        .as_str()
        .ok_or_else(|| RpcErr::BadParams(format!("parameter `{name}` must be a string")))
}

/// Route a request to its method handler.
pub async fn map_requests(request: &RpcRequest, context: &RpcContext) -> Result<Value, RpcErr> {
    let params = &request.params;
    tracing::debug!(method = %request.method, "dispatching RPC request");
    match request.method.as_str() {
        "rpc_modules" => misc::rpc_modules(),
        "net_version" => misc::net_version(),
        "net_listening" => misc::net_listening(),
        "web3_clientVersion" => misc::client_version(context),
        "evm_snapshot" => misc::evm_snapshot(),
        "evm_revert" => misc::evm_revert(),
        "debug_traceTransaction" => misc::trace_transaction(params, context).await,
        "debug_storageRangeAt" => misc::storage_range_at(),
        "eth_accounts" => eth::accounts(context),
        "eth_getBalance" => eth::get_balance(params, context).await,
        "eth_getCode" => eth::get_code(params, context).await,
        "eth_getStorageAt" => eth::get_storage_at(params, context).await,
        "eth_blockNumber" => eth::block_number(context).await,
        "eth_getTransactionCount" => eth::get_transaction_count(),
        "eth_estimateGas" => eth::estimate_gas(params, context).await,
        "eth_call" => eth::call(params, context).await,
        "eth_sendTransaction" => eth::send_transaction(params, context).await,
        "eth_sendRawTransaction" => eth::send_raw_transaction(params, context).await,
        "eth_getTransactionByHash" => eth::get_transaction_by_hash(params, context).await,
        "eth_getTransactionReceipt" => eth::get_transaction_receipt(params, context).await,
        "eth_getBlockByHash" | "eth_getBlockByNumber" => eth::get_block(params, context).await,
        "eth_newBlockFilter" => eth::new_block_filter(context).await,
        "eth_uninstallFilter" => eth::uninstall_filter(params, context),
        "eth_getFilterChanges" => eth::get_filter_changes(params, context).await,
        "eth_getLogs" => eth::get_logs(params, context).await,
        unknown => Err(RpcErr::MethodNotFound(unknown.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_round_trip_both_shapes() {
        let numeric: RpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"eth_blockNumber"}"#)
                .unwrap();
        assert!(matches!(numeric.id, RpcRequestId::Number(7)));

        let textual: RpcRequest = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":"abc","method":"eth_blockNumber","params":[]}"#,
        )
        .unwrap();
        assert!(matches!(textual.id, RpcRequestId::String(_)));
    }

    #[test]
    fn error_codes_match_the_taxonomy() {
        let meta: RpcErrorMetadata = RpcErr::MethodNotFound("x".into()).into();
        assert_eq!(meta.code, -32601);
        let meta: RpcErrorMetadata = RpcErr::BadParams("x".into()).into();
        assert_eq!(meta.code, -32602);
        let meta: RpcErrorMetadata = RpcErr::BackendUnavailable("x".into()).into();
        assert_eq!(meta.code, -32010);
        let meta: RpcErrorMetadata = RpcErr::Reverted("nope".into()).into();
        assert_eq!(meta.code, -32000);
        assert!(meta.message.contains("nope"));
    }

    #[test]
    fn responses_carry_the_request_id() {
        let ok = rpc_response(RpcRequestId::Number(3), Ok(Value::String("0x0".into())));
        assert_eq!(ok["id"], 3);
        assert_eq!(ok["jsonrpc"], "2.0");
        assert_eq!(ok["result"], "0x0");

        let err = rpc_response(
            RpcRequestId::String("q".into()),
            Err(RpcErr::MethodNotFound("bogus".into())),
        );
        assert_eq!(err["id"], "q");
        assert_eq!(err["error"]["code"], -32601);
    }
}
