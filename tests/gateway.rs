//! End-to-end tests against a mock backend REST node.
//!
//! A small axum app emulates the backend surface (blocks, accounts,
//! storage, simulate calls, submissions) with a mutable best-block height,
//! and the tests drive the gateway's RPC dispatch exactly as the HTTP
//! transport would.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rpc_gateway::rpc::{map_requests, rpc_response, RpcContext, RpcRequest};
use rpc_gateway::{BackendClient, HttpServer, KeyVault};

/// Simulate calls against this address report a revert.
const REVERTING_ADDR: &str = "0x00000000000000000000000000000000000000bad";

#[derive(Clone)]
struct MockChain {
    best: Arc<AtomicU64>,
}

/// Deterministic 32-byte block id embedding the height; the low byte is the
/// chain tag every id shares.
fn block_id(number: u64) -> String {
    format!("0x{:08x}{}4a", number, "00".repeat(27))
}

fn block_json(number: u64) -> Value {
    json!({
        "number": number,
        "id": block_id(number),
        "size": 236,
        "parentID": block_id(number.saturating_sub(1)),
        "timestamp": 1_530_014_400 + number * 10,
        "gasLimit": 10_000_000,
        "gasUsed": 0,
        "totalScore": number,
        "txsRoot": "0x45b0cfc220ceec5b7c1c62c4d4193d38e4eba48e8815729ce75f9c0ab0e4c1c0",
        "stateRoot": "0x4ec3af0acbad1ae467ad569337d2fe8576fe303928d35b8cdd91de47e9ac84bb",
        "signer": "0xab7b27fc9e7d29f9f2e5bd361747a5515d0cc2d1",
        "isTrunk": true,
        "transactions": [],
    })
}

async fn get_block(State(chain): State<MockChain>, Path(revision): Path<String>) -> Json<Value> {
    let best = chain.best.load(Ordering::SeqCst);
    let number = if revision == "best" {
        Some(best)
    } else {
        revision.parse::<u64>().ok().filter(|n| *n <= best)
    };
    Json(number.map(block_json).unwrap_or(Value::Null))
}

async fn get_account(Path(_address): Path<String>) -> Json<Value> {
    Json(json!({"balance": "0x64", "energy": "0x0", "hasCode": false}))
}

async fn simulate(Path(address): Path<String>) -> Json<Value> {
    if address == REVERTING_ADDR {
        Json(json!({
            "data": "0x",
            "events": [],
            "transfers": [],
            "gasUsed": 0,
            "reverted": true,
            "vmError": "insufficient balance",
        }))
    } else {
        Json(json!({
            "data": "0x002a",
            "events": [],
            "transfers": [],
            "gasUsed": 21_000,
            "reverted": false,
            "vmError": "",
        }))
    }
}

async fn get_storage(Path((_address, key)): Path<(String, String)>) -> Json<Value> {
    // Echo the requested slot key so tests can observe padding.
    Json(json!({ "value": key }))
}

async fn submit_transaction(body: Json<Value>) -> Json<Value> {
    let raw_present = body
        .0
        .get("raw")
        .and_then(Value::as_str)
        .is_some_and(|raw| raw.starts_with("0x"));
    if raw_present {
        Json(json!({"id": "0xdeadbeef"}))
    } else {
        Json(Value::Null)
    }
}

async fn query_events() -> Json<Value> {
    Json(json!([]))
}

async fn start_mock_backend(best: u64) -> (SocketAddr, MockChain) {
    let chain = MockChain {
        best: Arc::new(AtomicU64::new(best)),
    };
    let app = Router::new()
        .route("/blocks/{revision}", get(get_block))
        .route("/accounts/{address}", get(get_account).post(simulate))
        .route("/accounts/{address}/storage/{key}", get(get_storage))
        .route("/transactions", post(submit_transaction))
        .route("/events", post(query_events))
        .with_state(chain.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, chain)
}

async fn gateway_context(addr: SocketAddr) -> RpcContext {
    let client = BackendClient::new(
        &format!("http://{addr}"),
        KeyVault::development().unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();
    RpcContext {
        client: Arc::new(client),
        client_version: "rpc-gateway/test".to_string(),
    }
}

fn request(method: &str, params: Value) -> RpcRequest {
    serde_json::from_value(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    }))
    .unwrap()
}

async fn dispatch(context: &RpcContext, method: &str, params: Value) -> Result<Value, String> {
    map_requests(&request(method, params), context)
        .await
        .map_err(|e| e.to_string())
}

#[tokio::test]
async fn block_number_reflects_the_backend_best_block() {
    let (addr, _chain) = start_mock_backend(100).await;
    let context = gateway_context(addr).await;
    let result = dispatch(&context, "eth_blockNumber", json!([])).await.unwrap();
    assert_eq!(result, json!("0x64"));
}

#[tokio::test]
async fn transaction_count_is_always_zero() {
    let (addr, _chain) = start_mock_backend(1).await;
    let context = gateway_context(addr).await;
    for address in ["0x1234", "0xabcd"] {
        let result = dispatch(&context, "eth_getTransactionCount", json!([address, "latest"]))
            .await
            .unwrap();
        assert_eq!(result, json!("0x0"));
    }
}

#[tokio::test]
async fn storage_positions_are_padded_to_64_digits() {
    let (addr, _chain) = start_mock_backend(1).await;
    let context = gateway_context(addr).await;
    let result = dispatch(
        &context,
        "eth_getStorageAt",
        json!(["0xab", "1", "latest"]),
    )
    .await
    .unwrap();
    assert_eq!(result, json!(format!("0x{}1", "0".repeat(63))));
}

#[tokio::test]
async fn filter_polls_never_repeat_a_block() {
    let (addr, chain) = start_mock_backend(5).await;
    let context = gateway_context(addr).await;

    let filter_id = dispatch(&context, "eth_newBlockFilter", json!([]))
        .await
        .unwrap();
    let filter_id = filter_id.as_str().unwrap().to_string();

    let mut batches = Vec::new();
    for best in [5u64, 5, 7, 7, 9] {
        chain.best.store(best, Ordering::SeqCst);
        let changes = dispatch(&context, "eth_getFilterChanges", json!([filter_id]))
            .await
            .unwrap();
        batches.push(changes.as_array().unwrap().clone());
    }

    assert_eq!(batches[0], Vec::<Value>::new());
    assert_eq!(batches[1], Vec::<Value>::new());
    assert_eq!(batches[2], vec![json!(block_id(6)), json!(block_id(7))]);
    assert_eq!(batches[3], Vec::<Value>::new());
    assert_eq!(batches[4], vec![json!(block_id(8)), json!(block_id(9))]);

    let all: Vec<&Value> = batches.iter().flatten().collect();
    let mut deduped = all.clone();
    deduped.dedup();
    assert_eq!(all, deduped, "a block id was reported twice");
}

#[tokio::test]
async fn uninstall_is_idempotent_and_polling_a_removed_filter_fails() {
    let (addr, _chain) = start_mock_backend(5).await;
    let context = gateway_context(addr).await;

    let filter_id = dispatch(&context, "eth_newBlockFilter", json!([]))
        .await
        .unwrap();
    assert_eq!(
        dispatch(&context, "eth_uninstallFilter", json!([filter_id]))
            .await
            .unwrap(),
        json!(true)
    );
    assert_eq!(
        dispatch(&context, "eth_uninstallFilter", json!([filter_id]))
            .await
            .unwrap(),
        json!(false)
    );
    let error = dispatch(&context, "eth_getFilterChanges", json!([filter_id]))
        .await
        .unwrap_err();
    assert!(error.contains("filter not found"));
}

#[tokio::test]
async fn gas_estimation_adds_margin_and_intrinsic_cost() {
    let (addr, _chain) = start_mock_backend(1).await;
    let context = gateway_context(addr).await;
    let result = dispatch(
        &context,
        "eth_estimateGas",
        json!([{
            "from": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "to": "0x0000000000000000000000000000000000000001",
            "data": "0x",
        }]),
    )
    .await
    .unwrap();
    // ceil(21000 * 1.2) + 21000 intrinsic = 25200 + 21000.
    assert_eq!(result, json!("0xb478"));
}

#[tokio::test]
async fn reverted_estimation_surfaces_the_backend_reason() {
    let (addr, _chain) = start_mock_backend(1).await;
    let context = gateway_context(addr).await;
    let error = dispatch(
        &context,
        "eth_estimateGas",
        json!([{ "to": REVERTING_ADDR, "data": "0x" }]),
    )
    .await
    .unwrap_err();
    assert!(error.contains("insufficient balance"));
}

#[tokio::test]
async fn call_returns_the_simulated_output() {
    let (addr, _chain) = start_mock_backend(1).await;
    let context = gateway_context(addr).await;
    let result = dispatch(
        &context,
        "eth_call",
        json!([{ "to": "0x01", "data": "0x" }, "latest"]),
    )
    .await
    .unwrap();
    assert_eq!(result, json!("0x002a"));
}

#[tokio::test]
async fn send_transaction_signs_and_submits() {
    let (addr, _chain) = start_mock_backend(3).await;
    let context = gateway_context(addr).await;
    let from = dispatch(&context, "eth_accounts", json!([]))
        .await
        .unwrap()[0]
        .clone();
    let result = dispatch(
        &context,
        "eth_sendTransaction",
        json!([{
            "from": from,
            "to": "0x0000000000000000000000000000000000000001",
            "value": "0x64",
        }]),
    )
    .await
    .unwrap();
    assert_eq!(result, json!("0xdeadbeef"));
}

#[tokio::test]
async fn sending_from_an_unloaded_account_fails() {
    let (addr, _chain) = start_mock_backend(3).await;
    let context = gateway_context(addr).await;
    let error = dispatch(
        &context,
        "eth_sendTransaction",
        json!([{
            "from": "0x0000000000000000000000000000000000000007",
            "to": "0x0000000000000000000000000000000000000001",
        }]),
    )
    .await
    .unwrap_err();
    assert!(error.contains("unknown account") || error.contains("no key"));
}

#[tokio::test]
async fn blocks_are_reshaped_into_the_ethereum_form() {
    let (addr, _chain) = start_mock_backend(5).await;
    let context = gateway_context(addr).await;
    let block = dispatch(&context, "eth_getBlockByNumber", json!(["0x5", false]))
        .await
        .unwrap();
    assert_eq!(block["hash"], json!(block_id(5)));
    assert_eq!(block["number"], json!("0x5"));
    assert_eq!(block["parentHash"], json!(block_id(4)));
    assert_eq!(block["miner"], json!("0xab7b27fc9e7d29f9f2e5bd361747a5515d0cc2d1"));
    assert_eq!(block["totalDifficulty"], json!("0x5"));
    assert!(block.get("id").is_none());

    let missing = dispatch(&context, "eth_getBlockByNumber", json!(["0x63", false]))
        .await
        .unwrap();
    assert_eq!(missing, Value::Null);
}

#[tokio::test]
async fn unknown_methods_are_rejected() {
    let (addr, _chain) = start_mock_backend(1).await;
    let context = gateway_context(addr).await;
    let error = dispatch(&context, "eth_coinbase", json!([])).await.unwrap_err();
    assert!(error.contains("method not found"));
}

#[tokio::test]
async fn unreachable_backend_reports_a_distinct_error() {
    // Nothing listens on this port.
    let client = BackendClient::new(
        "http://127.0.0.1:9",
        KeyVault::development().unwrap(),
        Duration::from_millis(300),
    )
    .unwrap();
    let context = RpcContext {
        client: Arc::new(client),
        client_version: "rpc-gateway/test".to_string(),
    };
    let result = map_requests(&request("eth_blockNumber", json!([])), &context).await;
    let response = rpc_response(request("eth_blockNumber", json!([])).id, result);
    assert_eq!(response["error"]["code"], json!(-32010));
}

#[tokio::test]
async fn http_transport_serves_json_rpc_with_cors() {
    let (backend_addr, _chain) = start_mock_backend(100).await;
    let context = gateway_context(backend_addr).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gateway_addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        HttpServer::new(context).run(listener).await.unwrap();
    });

    let http = reqwest::Client::new();
    let url = format!("http://{gateway_addr}/");

    // A well-formed request gets a JSON-RPC response with open CORS.
    let response = http
        .post(&url)
        .json(&json!({"jsonrpc": "2.0", "id": 7, "method": "eth_blockNumber", "params": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], json!(7));
    assert_eq!(body["result"], json!("0x64"));

    // A batch gets an array of responses.
    let body: Value = http
        .post(&url)
        .json(&json!([
            {"jsonrpc": "2.0", "id": 1, "method": "net_version", "params": []},
            {"jsonrpc": "2.0", "id": 2, "method": "net_listening", "params": []},
        ]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body[0]["result"], json!(5777));
    assert_eq!(body[1]["result"], json!(false));

    // A non-JSON-RPC body gets an empty 200.
    let response = http.post(&url).body("not json").send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().is_empty());
}
