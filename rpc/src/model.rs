use indexer_core::{BlockHash, Txid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i32, message: String },
}

/// One historical address-affecting event as returned by the node's
/// address index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressHistoryDelta {
    pub address: String,
    pub txid: Txid,
    pub height: u32,
    pub block_index: u32,
    pub index: u32,
    pub satoshis: i64,
    #[serde(default)]
    pub prev_txid: Option<Txid>,
    #[serde(default)]
    pub prev_index: Option<u32>,
}

/// Address history over a height range. The node reports its chain tip
/// at response time; callers compare it against their own tip to detect
/// the chain moving mid-query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDeltaResponse {
    #[serde(default)]
    pub deltas: Vec<AddressHistoryDelta>,
    pub tip_hash: BlockHash,
    pub tip_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUtxo {
    pub address: String,
    pub txid: Txid,
    pub index: u32,
    pub height: u32,
    pub satoshis: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUtxoResponse {
    #[serde(default)]
    pub utxos: Vec<AddressUtxo>,
    pub tip_hash: BlockHash,
    pub tip_height: u32,
}
