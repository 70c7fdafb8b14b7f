//! The stateful backend façade every RPC request flows through.
//!
//! # Responsibilities
//! - Issue REST calls against the configured backend endpoint
//! - Normalize "not found" (null/empty body) to `None`, never an error
//! - Convert responses through the codec
//! - Resolve keys, build and submit signed transactions
//! - Own the filter registry
//!
//! One instance is constructed at startup and injected wherever chain access
//! is needed; there is no process-wide singleton. Every outbound call
//! carries the configured timeout, and mutating calls are never retried —
//! retrying a submission risks double spending the payload.

use std::time::Duration;

use alloy::primitives::Address;
use serde::Serialize;
use serde_json::{json, Value};

use crate::backend::filters::{advance, FilterTable};
use crate::backend::routes::Routes;
use crate::backend::transaction::TxBuilder;
use crate::backend::types::{
    BackendError, BackendResult, EthTransaction, EventQuery, RawTxRequest, SimulateRequest,
    SimulateResult,
};
use crate::codec::quantity::decode_quantity_u64;
use crate::codec::{convert, encode_quantity, gas, CodecError, Revision};
use crate::keystore::KeyVault;

/// Backend REST client plus the per-process account and filter state.
pub struct BackendClient {
    http: reqwest::Client,
    routes: Routes,
    vault: KeyVault,
    filters: FilterTable,
}

impl BackendClient {
    /// Create a client for the given endpoint.
    ///
    /// The endpoint is validated but not contacted; use [`probe`] to check
    /// reachability at startup.
    ///
    /// [`probe`]: BackendClient::probe
    pub fn new(endpoint: &str, vault: KeyVault, timeout: Duration) -> BackendResult<Self> {
        let routes = Routes::new(endpoint)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            routes,
            vault,
            filters: FilterTable::new(),
        })
    }

    pub fn vault(&self) -> &KeyVault {
        &self.vault
    }

    /// Check that the backend answers at all.
    pub async fn probe(&self) -> BackendResult<()> {
        self.block_raw(&Revision::Best).await.map(|_| ())
    }

    async fn read_body(url: &str, response: reqwest::Response) -> BackendResult<Option<Value>> {
        let status = response.status();
        let text = response.text().await.map_err(BackendError::from)?;
        if !status.is_success() {
            tracing::warn!(%status, url, "backend rejected request");
            return Err(BackendError::Rejected(text.trim().to_string()));
        }
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|e| BackendError::Schema(format!("{url}: {e}")))
    }

    async fn get(&self, url: String, query: &[(&str, String)]) -> BackendResult<Option<Value>> {
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "backend GET failed");
                BackendError::from(e)
            })?;
        Self::read_body(&url, response).await
    }

    async fn post<B: Serialize>(
        &self,
        url: String,
        query: &[(&str, String)],
        body: &B,
    ) -> BackendResult<Option<Value>> {
        let response = self
            .http
            .post(&url)
            .query(query)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "backend POST failed");
                BackendError::from(e)
            })?;
        Self::read_body(&url, response).await
    }

    fn revision_query(revision: &Revision) -> Vec<(&'static str, String)> {
        vec![("revision", revision.to_string())]
    }

    /// The raw backend block at a revision, if it exists.
    pub async fn block_raw(&self, revision: &Revision) -> BackendResult<Option<Value>> {
        self.get(self.routes.block(revision), &[]).await
    }

    /// An Ethereum-shaped block at a revision.
    pub async fn get_block(&self, revision: &Revision) -> BackendResult<Option<Value>> {
        match self.block_raw(revision).await? {
            Some(block) => Ok(Some(convert::block_to_eth(&block)?)),
            None => Ok(None),
        }
    }

    /// Height of the current best block.
    pub async fn block_number(&self) -> BackendResult<Option<u64>> {
        match self.block_raw(&Revision::Best).await? {
            Some(block) => {
                let number = block.get("number").ok_or_else(|| {
                    CodecError::Schema("best block is missing `number`".into())
                })?;
                Ok(Some(decode_quantity_u64(number)?))
            }
            None => Ok(None),
        }
    }

    /// Id of the block at a revision, if it exists.
    pub async fn block_id(&self, revision: &Revision) -> BackendResult<Option<String>> {
        match self.block_raw(revision).await? {
            Some(block) => {
                let id = block
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CodecError::Schema("block is missing `id`".into()))?;
                Ok(Some(id.to_string()))
            }
            None => Ok(None),
        }
    }

    /// Account balance as the backend's hex string, or `None` if unknown.
    pub async fn get_balance(
        &self,
        address: &str,
        revision: &Revision,
    ) -> BackendResult<Option<Value>> {
        match self
            .get(
                self.routes.account(Some(address)),
                &Self::revision_query(revision),
            )
            .await?
        {
            Some(account) => Ok(Some(
                account
                    .get("balance")
                    .cloned()
                    .ok_or_else(|| CodecError::Schema("account is missing `balance`".into()))?,
            )),
            None => Ok(None),
        }
    }

    /// Deployed code at an address.
    pub async fn get_code(
        &self,
        address: &str,
        revision: &Revision,
    ) -> BackendResult<Option<Value>> {
        match self
            .get(self.routes.code(address), &Self::revision_query(revision))
            .await?
        {
            Some(code) => Ok(Some(
                code.get("code")
                    .cloned()
                    .ok_or_else(|| CodecError::Schema("code result is missing `code`".into()))?,
            )),
            None => Ok(None),
        }
    }

    /// Storage slot value at an address; `key` must already be padded.
    pub async fn get_storage_at(
        &self,
        address: &str,
        key: &str,
        revision: &Revision,
    ) -> BackendResult<Option<Value>> {
        match self
            .get(
                self.routes.storage(address, key),
                &Self::revision_query(revision),
            )
            .await?
        {
            Some(slot) => Ok(Some(slot.get("value").cloned().ok_or_else(|| {
                CodecError::Schema("storage result is missing `value`".into())
            })?)),
            None => Ok(None),
        }
    }

    /// An Ethereum-shaped transaction by id.
    pub async fn get_transaction_by_hash(&self, id: &str) -> BackendResult<Option<Value>> {
        match self.get(self.routes.transaction(id), &[]).await? {
            Some(tx) => Ok(Some(convert::tx_to_eth(&tx)?)),
            None => Ok(None),
        }
    }

    /// An Ethereum-shaped receipt by transaction id.
    pub async fn get_transaction_receipt(&self, id: &str) -> BackendResult<Option<Value>> {
        match self.get(self.routes.receipt(id), &[]).await? {
            Some(receipt) => Ok(Some(convert::receipt_to_eth(&receipt)?)),
            None => Ok(None),
        }
    }

    /// Dry-run the transaction and estimate its gas.
    ///
    /// Fails when the backend reports the call as reverted. Otherwise the
    /// estimate is ceil(reported gas × 1.2) plus the intrinsic gas; the 20%
    /// margin guards against underestimation.
    pub async fn estimate_gas(&self, tx: &EthTransaction) -> BackendResult<u64> {
        let data = tx.data_bytes()?;
        let body = SimulateRequest {
            data: tx.data_hex().to_string(),
            value: encode_quantity(tx.value()?),
            caller: tx.from.clone(),
        };
        let Some(result) = self
            .post(self.routes.account(tx.to.as_deref()), &[], &body)
            .await?
        else {
            return Ok(0);
        };
        let simulation: SimulateResult = serde_json::from_value(result)
            .map_err(|e| BackendError::Schema(format!("simulate result: {e}")))?;
        if simulation.reverted {
            let reason = if simulation.vm_error.is_empty() {
                "execution reverted".to_string()
            } else {
                simulation.vm_error
            };
            return Err(BackendError::Reverted(reason));
        }
        let padded = (simulation.gas_used * 12).div_ceil(10);
        Ok(padded + gas::intrinsic_gas(tx.creates_contract(), &data))
    }

    /// Read-only execution; returns the raw output bytes, or `None` when the
    /// target does not exist.
    pub async fn call(
        &self,
        tx: &EthTransaction,
        revision: &Revision,
    ) -> BackendResult<Option<Value>> {
        let body = SimulateRequest {
            data: tx.data_hex().to_string(),
            value: encode_quantity(tx.value()?),
            caller: None,
        };
        match self
            .post(
                self.routes.account(tx.to.as_deref()),
                &Self::revision_query(revision),
                &body,
            )
            .await?
        {
            Some(result) => Ok(Some(result.get("data").cloned().ok_or_else(|| {
                CodecError::Schema("call result is missing `data`".into())
            })?)),
            None => Ok(None),
        }
    }

    /// Resolve chain-binding parameters for transaction construction.
    ///
    /// The genesis and best block lookups are independent reads and run
    /// concurrently.
    pub async fn tx_builder(&self) -> BackendResult<TxBuilder> {
        let (genesis, best) = tokio::try_join!(
            self.block_id(&Revision::Number(0)),
            self.block_id(&Revision::Best),
        )?;
        let genesis =
            genesis.ok_or_else(|| BackendError::Schema("genesis block missing".into()))?;
        let best = best.ok_or_else(|| BackendError::Schema("best block missing".into()))?;
        TxBuilder::from_block_ids(&genesis, &best)
    }

    /// Sign and submit an Ethereum-shaped transaction; returns the backend
    /// transaction id.
    pub async fn send_transaction(&self, tx: &EthTransaction) -> BackendResult<Option<String>> {
        let from = tx
            .from
            .as_deref()
            .ok_or_else(|| CodecError::InvalidHex("transaction is missing `from`".into()))?;
        let from: Address = from
            .parse()
            .map_err(|_| CodecError::InvalidHex(format!("bad `from` address: {from}")))?;
        let key = self.vault.private_key(&from)?;
        let builder = self.tx_builder().await?;
        let signed = builder.build_signed(tx, key)?;
        tracing::debug!(from = %format!("{from:#x}"), gas = signed.gas, "submitting transaction");
        self.send_raw_transaction(&signed.raw_hex()).await
    }

    /// Submit a pre-signed raw payload; returns the backend transaction id.
    ///
    /// Submission is fire-and-forget: once sent it cannot be rolled back.
    pub async fn send_raw_transaction(&self, raw: &str) -> BackendResult<Option<String>> {
        let body = RawTxRequest {
            raw: raw.to_string(),
        };
        match self.post(self.routes.transactions(), &[], &body).await? {
            Some(result) => {
                let id = result
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        BackendError::Schema("submission result is missing `id`".into())
                    })?
                    .to_string();
                tracing::info!(tx_id = %id, "transaction submitted");
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Query logs matching an address and expanded topic sets.
    pub async fn get_logs(
        &self,
        address: Option<&str>,
        query: &EventQuery,
    ) -> BackendResult<Value> {
        let params: Vec<(&str, String)> = address
            .map(|a| vec![("address", a.to_string())])
            .unwrap_or_default();
        let logs = self
            .post(self.routes.events(), &params, query)
            .await?
            .unwrap_or(Value::Null);
        let address_value = address.map(|a| Value::String(a.to_string())).unwrap_or(Value::Null);
        Ok(convert::logs_to_eth(&address_value, &logs)?)
    }

    /// Run the backend tracer over a transaction.
    pub async fn trace_transaction(
        &self,
        id: &str,
        mut params: Value,
    ) -> BackendResult<Option<Value>> {
        if let Some(config) = params.as_object_mut() {
            // Ethereum-only knob the backend tracer does not know.
            config.remove("fullStorage");
        }
        let body = json!({ "logConfig": params });
        self.post(self.routes.trace(id), &[], &body).await
    }

    /// Register a new block filter anchored at the current best block.
    pub async fn new_block_filter(&self) -> BackendResult<String> {
        let best = self
            .block_number()
            .await?
            .ok_or_else(|| BackendError::Schema("best block missing".into()))?;
        let id = self.filters.insert(best);
        tracing::debug!(filter_id = %id, best, "block filter installed");
        Ok(id)
    }

    /// Report the ids of blocks produced since the last poll.
    ///
    /// Block numbers that resolve to nothing (a fork made them transiently
    /// missing) are skipped but still count as reported. Polls of the same
    /// filter are serialized; the cursor advances only after the whole range
    /// has been fetched.
    pub async fn get_filter_changes(&self, id: &str) -> BackendResult<Vec<String>> {
        let filter = self
            .filters
            .get(id)
            .ok_or_else(|| BackendError::FilterNotFound(id.to_string()))?;
        let mut state = filter.lock().await;
        let Some(best) = self.block_number().await? else {
            return Ok(Vec::new());
        };
        let (next, range) = advance(state.next, best);
        let mut ids = Vec::new();
        if let Some(range) = range {
            for number in range {
                if let Some(block_id) = self.block_id(&Revision::Number(number)).await? {
                    ids.push(block_id);
                }
            }
        }
        state.next = next;
        Ok(ids)
    }

    /// Remove a filter. Safe to call twice.
    pub fn uninstall_filter(&self, id: &str) -> bool {
        let removed = self.filters.remove(id);
        tracing::debug!(filter_id = %id, removed, "block filter uninstalled");
        removed
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("routes", &self.routes)
            .field("filters", &self.filters.len())
            .finish()
    }
}
