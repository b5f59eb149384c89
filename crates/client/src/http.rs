//! HTTP JSON-RPC adapter with bounded fixed-delay retry.

use crate::{
    ChainClient, ClientError, ClientResult, RawTransaction, TxOut, VerboseBlock,
    WalletTransaction, types::MempoolAcceptResult,
};
use alloy_primitives::hex;
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Connection and retry configuration for the HTTP adapter.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// The node's HTTP endpoint.
    pub endpoint: Url,
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
    /// Sleep between attempts.
    pub retry_delay: Duration,
    /// Maximum attempts per call before the last error is surfaced.
    pub max_attempts: u32,
}

impl HttpClientConfig {
    /// Builds a config with the default retry policy: ten-second delay,
    /// effectively unbounded attempt count.
    pub fn new(endpoint: Url, username: String, password: String) -> Self {
        Self { endpoint, username, password, retry_delay: Duration::from_secs(10), max_attempts: 999 }
    }
}

/// The JSON-RPC 1.0 response envelope.
#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    error: Option<RpcErrorObject>,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Production [`ChainClient`] over HTTP with basic authentication.
///
/// Every RPC goes through one retry path: attempt, sleep the configured
/// delay on failure, retry up to the configured attempt count, and return
/// the last error when all attempts fail.
#[derive(Debug)]
pub struct HttpChainClient {
    config: HttpClientConfig,
    http: reqwest::Client,
}

impl HttpChainClient {
    /// Creates a client from the given configuration.
    pub fn new(config: HttpClientConfig) -> Self {
        Self { config, http: reqwest::Client::new() }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> ClientResult<T> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.call_once(method, &params).await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if attempt >= self.config.max_attempts {
                        return Err(err);
                    }
                    debug!(target: "chain_client", %err, method, attempt, "source node call failed, retrying");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        }
    }

    async fn call_once<T: DeserializeOwned>(&self, method: &str, params: &Value) -> ClientResult<T> {
        let body = json!({ "jsonrpc": "1.0", "id": "heron", "method": method, "params": params });
        let response = self
            .http
            .post(self.config.endpoint.clone())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .json(&body)
            .send()
            .await?;
        let envelope: RpcEnvelope = response.json().await?;
        if let Some(err) = envelope.error {
            if err.code != 0 {
                return Err(ClientError::Rpc { code: err.code, message: err.message });
            }
        }
        Ok(serde_json::from_value(envelope.result)?)
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn raw_mempool(&self) -> ClientResult<Vec<String>> {
        self.call("getrawmempool", json!([])).await
    }

    async fn raw_transaction_verbose(&self, txid: &str) -> ClientResult<RawTransaction> {
        self.call("getrawtransaction", json!([txid, 1])).await
    }

    async fn wallet_transaction(&self, txid: &str) -> ClientResult<WalletTransaction> {
        self.call("gettransaction", json!([txid])).await
    }

    async fn block_count(&self) -> ClientResult<u64> {
        self.call("getblockcount", json!([])).await
    }

    async fn block_hash(&self, height: u64) -> ClientResult<String> {
        self.call("getblockhash", json!([height])).await
    }

    async fn block_with_txs(&self, hash: &str) -> ClientResult<VerboseBlock> {
        self.call("getblock", json!([hash, 2])).await
    }

    async fn test_mempool_accept(&self, raw_tx: &[u8]) -> ClientResult<()> {
        let results: Vec<MempoolAcceptResult> =
            self.call("testmempoolaccept", json!([[hex::encode(raw_tx)]])).await?;
        let [result] = results.as_slice() else {
            return Err(ClientError::InvalidResponse(format!(
                "testmempoolaccept returned {} entries, expected 1",
                results.len()
            )));
        };
        if !result.allowed {
            return Err(ClientError::Rejected(result.reject_reason.clone()));
        }
        Ok(())
    }

    async fn send_raw_transaction(&self, raw_tx: &[u8]) -> ClientResult<String> {
        self.call("sendrawtransaction", json!([hex::encode(raw_tx), true])).await
    }

    async fn tx_out(
        &self,
        txid: &str,
        vout: u32,
        include_mempool: bool,
    ) -> ClientResult<Option<TxOut>> {
        self.call("gettxout", json!([txid, vout, include_mempool])).await
    }
}
