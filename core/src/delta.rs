use serde::{Deserialize, Serialize};

use crate::hash::{BlockHash, Txid};

/// A value credited to an address by a transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDelta {
    pub address: String,
    pub satoshis: i64,
    pub index: u32,
}

/// A value debited from an address by a transaction input spending a
/// previous output. `satoshis` is negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDelta {
    pub address: String,
    pub satoshis: i64,
    pub index: u32,
    pub prev_txid: Txid,
    pub prev_index: u32,
}

/// All address-affecting events within one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxDelta {
    pub txid: Txid,
    pub block_index: u32,
    #[serde(default)]
    pub inputs: Vec<InputDelta>,
    #[serde(default)]
    pub outputs: Vec<OutputDelta>,
}

/// A raw block as reported by the node: header linkage plus the
/// per-transaction input/output deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDelta {
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    pub height: u32,
    #[serde(default)]
    pub deltas: Vec<TxDelta>,
}

/// One flattened address-affecting event, as produced by the block
/// filter and by address history queries. Inputs carry the spent
/// outpoint so UTXO projections can be reversed on reorg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDelta {
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
