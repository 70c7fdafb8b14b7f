//! `net_*`, `web3_*`, `evm_*`, `debug_*`, and `rpc_modules` handlers.
//!
//! The `evm_*` pair exists only so test harnesses that expect a
//! snapshot/revert interface keep working; the backend has no such thing.

use serde_json::{json, Value};

use crate::codec::encode_quantity;
use crate::rpc::{param, require_str, RpcContext, RpcErr};

pub fn rpc_modules() -> Result<Value, RpcErr> {
    Ok(json!({
        "eth": "1.0",
        "net": "1.0",
        "web3": "1.0",
    }))
}

pub fn net_version() -> Result<Value, RpcErr> {
    Ok(json!(5777))
}

pub fn net_listening() -> Result<Value, RpcErr> {
    Ok(json!(false))
}

pub fn client_version(context: &RpcContext) -> Result<Value, RpcErr> {
    Ok(json!(context.client_version))
}

pub fn evm_snapshot() -> Result<Value, RpcErr> {
    Ok(json!(encode_quantity(0u64)))
}

pub fn evm_revert() -> Result<Value, RpcErr> {
    Ok(json!(true))
}

pub async fn trace_transaction(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let hash = require_str(params, 0, "transaction hash")?;
    let config = param(params, 1).cloned().unwrap_or_else(|| json!({}));
    Ok(context
        .client
        .trace_transaction(hash, config)
        .await?
        .unwrap_or(Value::Null))
}

/// The backend offers no storage-range resource; the method is routed so
/// debuggers get a well-formed null instead of a method-not-found error.
pub fn storage_range_at() -> Result<Value, RpcErr> {
    Ok(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stubs_return_their_documented_constants() {
        assert_eq!(net_version().unwrap(), json!(5777));
        assert_eq!(net_listening().unwrap(), json!(false));
        assert_eq!(evm_snapshot().unwrap(), json!("0x0"));
        assert_eq!(evm_revert().unwrap(), json!(true));
        assert_eq!(storage_range_at().unwrap(), Value::Null);
    }

    #[test]
    fn module_listing_is_stable() {
        let modules = rpc_modules().unwrap();
        assert_eq!(modules["eth"], "1.0");
        assert_eq!(modules["net"], "1.0");
        assert_eq!(modules["web3"], "1.0");
    }
}
