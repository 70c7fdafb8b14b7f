//! Reshaping backend REST responses into Ethereum JSON-RPC results.
//!
//! # Responsibilities
//! - Rename backend block fields to their Ethereum names
//! - Re-encode raw integers as hex quantities
//! - Map receipt revert flags to Ethereum status codes
//! - Flatten single-clause transactions into the Ethereum transaction shape
//! - Synthesize log indices the backend does not number
//!
//! Conversions are generic over the JSON object so unknown backend fields
//! pass through untouched; missing expected fields are schema errors, never
//! silently dropped.

use serde_json::{Map, Value};

use crate::codec::quantity::{decode_quantity, encode_quantity, CodecError, CodecResult};

/// Backend block field → Ethereum block field.
const BLOCK_RENAMES: [(&str, &str); 5] = [
    ("id", "hash"),
    ("parentID", "parentHash"),
    ("signer", "miner"),
    ("totalScore", "totalDifficulty"),
    ("txsRoot", "transactionsRoot"),
];

/// Block fields the backend reports as raw integers.
const BLOCK_NUMERIC: [&str; 6] = [
    "number",
    "size",
    "timestamp",
    "gasLimit",
    "gasUsed",
    "totalScore",
];

fn as_object<'a>(value: &'a Value, what: &str) -> CodecResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CodecError::Schema(format!("{what} is not an object: {value}")))
}

fn member<'a>(map: &'a Map<String, Value>, key: &str, what: &str) -> CodecResult<&'a Value> {
    map.get(key)
        .ok_or_else(|| CodecError::Schema(format!("{what} is missing field `{key}`")))
}

fn quantity_field(map: &Map<String, Value>, key: &str, what: &str) -> CodecResult<Value> {
    Ok(Value::String(encode_quantity(decode_quantity(member(
        map, key, what,
    )?)?)))
}

/// Convert a backend block into the Ethereum block shape.
///
/// Field renames and numeric re-encoding only; every other field (including
/// the transaction id list) passes through as-is.
pub fn block_to_eth(block: &Value) -> CodecResult<Value> {
    let block = as_object(block, "block")?;
    let mut eth = Map::with_capacity(block.len());
    for (key, value) in block {
        let renamed = BLOCK_RENAMES
            .iter()
            .find(|(from, _)| from == key)
            .map(|(_, to)| *to)
            .unwrap_or(key.as_str());
        let converted = if BLOCK_NUMERIC.contains(&key.as_str()) {
            Value::String(encode_quantity(decode_quantity(value)?))
        } else {
            value.clone()
        };
        eth.insert(renamed.to_string(), converted);
    }
    Ok(Value::Object(eth))
}

/// Convert a backend receipt into the Ethereum receipt shape.
///
/// `reverted` maps to `status` `0x0`/`0x1`; a reverted receipt carries null
/// `contractAddress` and `logs`.
pub fn receipt_to_eth(receipt: &Value) -> CodecResult<Value> {
    let receipt = as_object(receipt, "receipt")?;
    let meta = as_object(member(receipt, "meta", "receipt")?, "receipt meta")?;
    let reverted = member(receipt, "reverted", "receipt")?
        .as_bool()
        .ok_or_else(|| CodecError::Schema("receipt `reverted` is not a bool".into()))?;
    let gas_used = quantity_field(receipt, "gasUsed", "receipt")?;
    let tx_id = member(meta, "txID", "receipt meta")?.clone();
    let block_id = member(meta, "blockID", "receipt meta")?.clone();
    let block_number = quantity_field(meta, "blockNumber", "receipt meta")?;

    let first_output = receipt
        .get("outputs")
        .and_then(Value::as_array)
        .and_then(|outputs| outputs.first());

    let (contract_address, logs) = if reverted {
        (Value::Null, Value::Null)
    } else {
        let contract_address = first_output
            .and_then(|output| output.get("contractAddress"))
            .cloned()
            .unwrap_or(Value::Null);
        let events = first_output
            .and_then(|output| output.get("events"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let logs = events
            .iter()
            .enumerate()
            .map(|(index, event)| {
                receipt_log_to_eth(&tx_id, &block_id, &block_number, index, event)
            })
            .collect::<CodecResult<Vec<_>>>()?;
        (contract_address, Value::Array(logs))
    };

    let mut eth = Map::new();
    eth.insert(
        "status".into(),
        Value::String(encode_quantity(u64::from(!reverted))),
    );
    eth.insert("transactionHash".into(), tx_id);
    eth.insert("transactionIndex".into(), Value::String(encode_quantity(0u64)));
    eth.insert("blockNumber".into(), block_number);
    eth.insert("blockHash".into(), block_id);
    eth.insert("cumulativeGasUsed".into(), gas_used.clone());
    eth.insert("gasUsed".into(), gas_used);
    eth.insert("contractAddress".into(), contract_address);
    eth.insert("logs".into(), logs);
    Ok(Value::Object(eth))
}

fn receipt_log_to_eth(
    tx_id: &Value,
    block_id: &Value,
    block_number: &Value,
    index: usize,
    event: &Value,
) -> CodecResult<Value> {
    let event = as_object(event, "receipt event")?;
    let mut eth = Map::new();
    eth.insert("type".into(), Value::String("mined".into()));
    eth.insert(
        "logIndex".into(),
        Value::String(encode_quantity(index as u64)),
    );
    eth.insert("transactionIndex".into(), Value::String(encode_quantity(0u64)));
    eth.insert("transactionHash".into(), tx_id.clone());
    eth.insert("blockHash".into(), block_id.clone());
    eth.insert("blockNumber".into(), block_number.clone());
    eth.insert(
        "address".into(),
        member(event, "address", "receipt event")?.clone(),
    );
    eth.insert("data".into(), member(event, "data", "receipt event")?.clone());
    eth.insert(
        "topics".into(),
        member(event, "topics", "receipt event")?.clone(),
    );
    Ok(Value::Object(eth))
}

/// Convert a backend transaction into the Ethereum transaction shape.
///
/// The backend groups transfers into clauses; an Ethereum transaction maps
/// to exactly one clause, so the first clause's `to`/`value`/`data` become
/// the Ethereum `to`/`value`/`input`.
pub fn tx_to_eth(tx: &Value) -> CodecResult<Value> {
    let tx = as_object(tx, "transaction")?;
    let meta = as_object(member(tx, "meta", "transaction")?, "transaction meta")?;
    let clauses = member(tx, "clauses", "transaction")?
        .as_array()
        .ok_or_else(|| CodecError::Schema("transaction `clauses` is not an array".into()))?;
    let clause = as_object(
        clauses
            .first()
            .ok_or_else(|| CodecError::Schema("transaction has no clauses".into()))?,
        "clause",
    )?;

    let mut eth = Map::new();
    eth.insert("hash".into(), member(tx, "id", "transaction")?.clone());
    eth.insert("nonce".into(), member(tx, "nonce", "transaction")?.clone());
    eth.insert(
        "blockHash".into(),
        member(meta, "blockID", "transaction meta")?.clone(),
    );
    eth.insert(
        "blockNumber".into(),
        quantity_field(meta, "blockNumber", "transaction meta")?,
    );
    eth.insert("transactionIndex".into(), Value::String(encode_quantity(0u64)));
    eth.insert("from".into(), member(tx, "origin", "transaction")?.clone());
    eth.insert("to".into(), member(clause, "to", "clause")?.clone());
    eth.insert("value".into(), member(clause, "value", "clause")?.clone());
    eth.insert("gas".into(), quantity_field(tx, "gas", "transaction")?);
    eth.insert("gasPrice".into(), Value::String(encode_quantity(1u64)));
    eth.insert("input".into(), member(clause, "data", "clause")?.clone());
    Ok(Value::Object(eth))
}

/// Convert a backend event-query result into Ethereum log objects.
///
/// The backend does not number its logs; indices are synthesized zero-based
/// in result order. `address` is the address the query filtered on.
pub fn logs_to_eth(address: &Value, logs: &Value) -> CodecResult<Value> {
    let logs = match logs {
        Value::Null => return Ok(Value::Array(Vec::new())),
        Value::Array(logs) => logs,
        other => {
            return Err(CodecError::Schema(format!(
                "event query result is not an array: {other}"
            )))
        }
    };
    let converted = logs
        .iter()
        .enumerate()
        .map(|(index, log)| {
            let log = as_object(log, "event log")?;
            let meta = as_object(member(log, "meta", "event log")?, "event log meta")?;
            let mut eth = Map::new();
            eth.insert(
                "logIndex".into(),
                Value::String(encode_quantity(index as u64)),
            );
            eth.insert(
                "blockNumber".into(),
                quantity_field(meta, "blockNumber", "event log meta")?,
            );
            eth.insert(
                "blockHash".into(),
                member(meta, "blockID", "event log meta")?.clone(),
            );
            eth.insert(
                "transactionHash".into(),
                member(meta, "txID", "event log meta")?.clone(),
            );
            eth.insert("transactionIndex".into(), Value::String(encode_quantity(0u64)));
            eth.insert("address".into(), address.clone());
            eth.insert("data".into(), member(log, "data", "event log")?.clone());
            eth.insert("topics".into(), member(log, "topics", "event log")?.clone());
            Ok(Value::Object(eth))
        })
        .collect::<CodecResult<Vec<_>>>()?;
    Ok(Value::Array(converted))
}
