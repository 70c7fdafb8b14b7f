//! `eth_*` method handlers.

use serde_json::{json, Value};

use crate::backend::types::{EthTransaction, EventQuery, EventRange};
use crate::codec::quantity::decode_quantity_u64;
use crate::codec::{encode_quantity, pad_storage_key, topics, Revision};
use crate::rpc::{param, require, require_str, RpcContext, RpcErr};

fn revision_param(params: &Option<Vec<Value>>, index: usize) -> Result<Revision, RpcErr> {
    Ok(Revision::from_identifier(param(params, index))?)
}

fn or_null(value: Option<Value>) -> Value {
    value.unwrap_or(Value::Null)
}

pub fn accounts(context: &RpcContext) -> Result<Value, RpcErr> {
    let addresses: Vec<String> = context
        .client
        .vault()
        .accounts()
        .into_iter()
        .map(|address| format!("{address:#x}"))
        .collect();
    Ok(json!(addresses))
}

pub async fn get_balance(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let address = require_str(params, 0, "address")?;
    let revision = revision_param(params, 1)?;
    Ok(or_null(context.client.get_balance(address, &revision).await?))
}

pub async fn get_code(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let address = require_str(params, 0, "address")?;
    let revision = revision_param(params, 1)?;
    Ok(or_null(context.client.get_code(address, &revision).await?))
}

pub async fn get_storage_at(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let address = require_str(params, 0, "address")?;
    let position = require_str(params, 1, "position")?;
    let revision = revision_param(params, 2)?;
    let key = pad_storage_key(position);
    Ok(or_null(
        context
            .client
            .get_storage_at(address, &key, &revision)
            .await?,
    ))
}

pub async fn block_number(context: &RpcContext) -> Result<Value, RpcErr> {
    let best = context
        .client
        .block_number()
        .await?
        .ok_or_else(|| RpcErr::Internal("best block unavailable".into()))?;
    Ok(json!(encode_quantity(best)))
}

/// The backend has no account nonce; wallets get a constant zero.
pub fn get_transaction_count() -> Result<Value, RpcErr> {
    Ok(json!(encode_quantity(0u64)))
}

pub async fn estimate_gas(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let tx: EthTransaction = serde_json::from_value(require(params, 0, "transaction")?.clone())?;
    let estimate = context.client.estimate_gas(&tx).await?;
    Ok(json!(encode_quantity(estimate)))
}

pub async fn call(params: &Option<Vec<Value>>, context: &RpcContext) -> Result<Value, RpcErr> {
    let tx: EthTransaction = serde_json::from_value(require(params, 0, "transaction")?.clone())?;
    let revision = revision_param(params, 1)?;
    Ok(or_null(context.client.call(&tx, &revision).await?))
}

pub async fn send_transaction(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let tx: EthTransaction = serde_json::from_value(require(params, 0, "transaction")?.clone())?;
    Ok(or_null(
        context
            .client
            .send_transaction(&tx)
            .await?
            .map(Value::String),
    ))
}

pub async fn send_raw_transaction(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let raw = require_str(params, 0, "raw")?;
    Ok(or_null(
        context
            .client
            .send_raw_transaction(raw)
            .await?
            .map(Value::String),
    ))
}

pub async fn get_transaction_by_hash(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let hash = require_str(params, 0, "transaction hash")?;
    if hash.is_empty() {
        return Ok(Value::Null);
    }
    Ok(or_null(context.client.get_transaction_by_hash(hash).await?))
}

pub async fn get_transaction_receipt(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let hash = require_str(params, 0, "transaction hash")?;
    if hash.is_empty() {
        return Ok(Value::Null);
    }
    Ok(or_null(context.client.get_transaction_receipt(hash).await?))
}

/// Shared by `eth_getBlockByHash` and `eth_getBlockByNumber`; both take a
/// block identifier plus a flag selecting full transaction objects.
pub async fn get_block(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let revision = Revision::from_identifier(Some(require(params, 0, "block identifier")?))?;
    let full_tx = param(params, 1).and_then(Value::as_bool).unwrap_or(false);

    let Some(mut block) = context.client.get_block(&revision).await? else {
        return Ok(Value::Null);
    };

    if full_tx {
        let ids: Vec<String> = block
            .get("transactions")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let mut transactions = Vec::with_capacity(ids.len());
        for id in ids {
            transactions.push(or_null(context.client.get_transaction_by_hash(&id).await?));
        }
        if let Some(object) = block.as_object_mut() {
            object.insert("transactions".into(), Value::Array(transactions));
        }
    }
    Ok(block)
}

pub async fn new_block_filter(context: &RpcContext) -> Result<Value, RpcErr> {
    Ok(json!(context.client.new_block_filter().await?))
}

pub fn uninstall_filter(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let id = require_str(params, 0, "filter id")?;
    Ok(json!(context.client.uninstall_filter(id)))
}

pub async fn get_filter_changes(
    params: &Option<Vec<Value>>,
    context: &RpcContext,
) -> Result<Value, RpcErr> {
    let id = require_str(params, 0, "filter id")?;
    Ok(json!(context.client.get_filter_changes(id).await?))
}

pub async fn get_logs(params: &Option<Vec<Value>>, context: &RpcContext) -> Result<Value, RpcErr> {
    let filter = require(params, 0, "filter")?;
    let from_block = filter
        .get("fromBlock")
        .ok_or(RpcErr::MissingParam("fromBlock"))?;
    let to_block = match filter.get("toBlock") {
        Some(Value::Null) | None => None,
        Some(to_block) => Some(decode_quantity_u64(to_block)?),
    };
    let query = EventQuery {
        range: EventRange {
            unit: "block",
            from: decode_quantity_u64(from_block)?,
            to: to_block,
        },
        topic_sets: topics::topics_to_backend(filter.get("topics").unwrap_or(&Value::Null))?,
    };
    let address = filter.get("address").and_then(Value::as_str);
    Ok(context.client.get_logs(address, &query).await?)
}
