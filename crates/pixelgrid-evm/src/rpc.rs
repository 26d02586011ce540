//! HTTP JSON-RPC 2.0 client backed by `reqwest`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use pixelgrid_core::IndexError;

use crate::fetcher::{parse_hex_u64, EvmRpcClient, LogFilter, RawLog};

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    pub result: Option<Value>,
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Unwrap the result value or surface the RPC error.
    pub fn into_result(self) -> Result<Value, IndexError> {
        if let Some(err) = self.error {
            return Err(IndexError::Rpc(format!(
                "JSON-RPC error {}: {}",
                err.code, err.message
            )));
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// JSON-RPC client for a single provider endpoint.
pub struct HttpRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>) -> Result<Self, IndexError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IndexError::Rpc(format!("building HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one request and return the `result` value.
    pub async fn send(&self, method: &str, params: Value) -> Result<Value, IndexError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, method, params);

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| IndexError::Rpc(format!("{method}: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(IndexError::Rpc(format!("{method}: HTTP {status}: {body}")));
        }

        resp.json::<JsonRpcResponse>()
            .await
            .map_err(|e| IndexError::Rpc(format!("{method}: {e}")))?
            .into_result()
    }
}

#[async_trait]
impl EvmRpcClient for HttpRpcClient {
    async fn get_block_number(&self) -> Result<u64, IndexError> {
        let value = self.send("eth_blockNumber", json!([])).await?;
        let hex = value
            .as_str()
            .ok_or_else(|| IndexError::Rpc("eth_blockNumber: non-string result".into()))?;
        Ok(parse_hex_u64(hex))
    }

    async fn get_logs(
        &self,
        from: u64,
        to: u64,
        filter: &LogFilter,
    ) -> Result<Vec<RawLog>, IndexError> {
        let mut params = json!({
            "fromBlock": format!("0x{from:x}"),
            "toBlock": format!("0x{to:x}"),
            "topics": filter.topics,
        });
        if let Some(address) = &filter.address {
            params["address"] = json!(address);
        }

        let value = self.send("eth_getLogs", json!([params])).await?;
        serde_json::from_value(value)
            .map_err(|e| IndexError::Rpc(format!("eth_getLogs: malformed log list: {e}")))
    }

    async fn call(&self, to: &str, data: &str) -> Result<String, IndexError> {
        let value = self
            .send("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| IndexError::Rpc("eth_call: non-string result".into()))
    }
}
