//! RPC API trait definitions

use async_trait::async_trait;
use indexer_core::{BlockDelta, BlockHash};

use crate::model::{AddressDeltaResponse, AddressUtxoResponse, RpcError};

/// Read-only node RPC surface consumed by the write engine.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Resolves a height on the node's current chain to a block hash.
    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, RpcError>;

    /// Raw per-transaction input/output deltas for one block.
    async fn get_block_deltas(&self, hash: BlockHash) -> Result<BlockDelta, RpcError>;

    /// Address history over an inclusive height range.
    async fn get_address_deltas(
        &self,
        addresses: &[String],
        start: u32,
        end: u32,
    ) -> Result<AddressDeltaResponse, RpcError>;

    /// Unspent outputs for the addresses as of the node's current tip.
    async fn get_address_utxos(&self, addresses: &[String]) -> Result<AddressUtxoResponse, RpcError>;
}
