use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use indexer_core::{BlockDelta, BlockHash};
use serde::{Deserialize, Serialize};

use crate::api::NodeApi;
use crate::model::{AddressDeltaResponse, AddressUtxoResponse, RpcError};

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: u64,
    method: String,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// JSON-RPC 2.0 client for one node endpoint.
pub struct HttpNodeClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpNodeClient {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: method.to_string(),
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcError::Network(format!("request to {} failed: {}", self.url, e)))?;

        let response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Network(format!("response from {} unreadable: {}", self.url, e)))?;

        if let Some(error) = response.error {
            return Err(RpcError::Rpc { code: error.code, message: error.message });
        }
        Ok(response.result)
    }

    fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, RpcError> {
        serde_json::from_value(value).map_err(|e| RpcError::Internal(format!("deserialization error: {}", e)))
    }
}

#[async_trait]
impl NodeApi for HttpNodeClient {
    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, RpcError> {
        let result = self.call_method("getblockhash", serde_json::json!([height])).await?;
        Self::decode(result)
    }

    async fn get_block_deltas(&self, hash: BlockHash) -> Result<BlockDelta, RpcError> {
        let result = self.call_method("getblockdeltas", serde_json::json!([hash.to_string()])).await?;
        Self::decode(result)
    }

    async fn get_address_deltas(
        &self,
        addresses: &[String],
        start: u32,
        end: u32,
    ) -> Result<AddressDeltaResponse, RpcError> {
        let params = serde_json::json!([{
            "addresses": addresses,
            "start": start,
            "end": end,
            "chainInfo": true,
        }]);
        let result = self.call_method("getaddressdeltas", params).await?;
        Self::decode(result)
    }

    async fn get_address_utxos(&self, addresses: &[String]) -> Result<AddressUtxoResponse, RpcError> {
        let params = serde_json::json!([{
            "addresses": addresses,
            "chainInfo": true,
        }]);
        let result = self.call_method("getaddressutxos", params).await?;
        Self::decode(result)
    }
}
