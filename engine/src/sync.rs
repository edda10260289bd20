use std::collections::BTreeMap;

use database::stores::{BlockAction, PendingAction};
use database::Txn;
use indexer_core::{filter_block_deltas, BlockDelta, BlockHash, BlockRecord, BlockUndo, Txid, TxidIndex, Utxo, WalletId};
use rpc_client::RpcError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::engine::{Engine, Tip};
use crate::errors::{EngineError, EngineResult};

/// Node error code for a height the chain does not (yet) reach.
const RPC_HEIGHT_OUT_OF_RANGE: i32 = -8;

/// Target tip reported by the block notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub height: u32,
    pub block_hash: BlockHash,
}

impl Engine {
    /// Drives the index to the target tip, connecting forward along the
    /// node's chain and disconnecting the local tip whenever the chains
    /// disagree. Guarded so only one sync or import runs at a time.
    pub async fn sync(&self, target: SyncState) -> EngineResult<Value> {
        let _guard = self.busy.try_acquire().ok_or(EngineError::Busy)?;
        self.sync_to_target(&target).await?;
        Ok(match self.tip() {
            Some(t) => json!({ "height": t.height, "hash": t.hash.to_string() }),
            None => Value::Null,
        })
    }

    async fn sync_to_target(&self, target: &SyncState) -> EngineResult<()> {
        loop {
            if self.is_stopping() {
                return Ok(());
            }
            let tip = self.tip();
            let current = tip.as_ref().map_or(0, |t| t.height);

            if current >= target.height {
                match &tip {
                    None => return Ok(()),
                    Some(t) if t.height == target.height && t.hash == target.block_hash => return Ok(()),
                    Some(_) => {
                        self.disconnect_tip()?;
                        continue;
                    }
                }
            }

            let next_height = current + 1;
            let hash = match self.node.get_block_hash(next_height).await {
                Ok(hash) => hash,
                Err(RpcError::Rpc { code: RPC_HEIGHT_OUT_OF_RANGE, message }) => {
                    return Err(EngineError::Deferred(format!(
                        "height {} not yet available: {}",
                        next_height, message
                    )));
                }
                Err(e) => return Err(e.into()),
            };
            let block = self.node.get_block_deltas(hash).await?;

            match &tip {
                Some(t) if block.prev_hash != t.hash => self.disconnect_tip()?,
                _ => self.connect_block(&block)?,
            }
        }
    }

    /// Applies one block in a single transaction: txid entries, UTXO
    /// projections, balance deltas, the new tip record (carrying undo
    /// data) and a durability sync, then prunes retired history.
    pub(crate) fn connect_block(&self, block: &BlockDelta) -> EngineResult<()> {
        self.stage_action_marker(BlockAction::Connect, block.height, block.hash)?;
        match self.connect_block_txn(block) {
            Ok(record) => {
                *self.tip.write() = Some(Tip { height: record.height, hash: record.hash });
                info!(height = record.height, hash = %record.hash, "connected block");
                self.prune_retired_blocks(record.height)?;
                Ok(())
            }
            Err(e) => {
                self.clear_action_marker();
                Err(e)
            }
        }
    }

    fn connect_block_txn(&self, block: &BlockDelta) -> EngineResult<BlockRecord> {
        let global = self.global_filter.read().clone();
        let candidates = filter_block_deltas(block, &global);

        let mut txn = Txn::new();
        let mut undo = BlockUndo::default();
        let mut balance_deltas: BTreeMap<WalletId, i64> = BTreeMap::new();
        // Per wallet, the deduplicated set of (height, block index) →
        // txid positions this block contributes. One transaction can
        // touch the same wallet through several addresses.
        let mut positions: BTreeMap<WalletId, BTreeMap<(u32, u32), Txid>> = BTreeMap::new();

        for (address, deltas) in &candidates {
            for wallet_id in self.addresses.wallets_for_address(address)? {
                // The bloom filter is only a pre-filter; the address
                // record is the authoritative ownership check.
                if !self.addresses.contains(&wallet_id, address)? {
                    continue;
                }
                for delta in deltas {
                    let slot = positions.entry(wallet_id).or_default();
                    if let Some(existing) = slot.insert((delta.height, delta.block_index), delta.txid) {
                        if existing != delta.txid {
                            return Err(EngineError::InvalidState(format!(
                                "two txids claim position ({}, {})",
                                delta.height, delta.block_index
                            )));
                        }
                    }
                    *balance_deltas.entry(wallet_id).or_insert(0) += delta.satoshis;

                    match (delta.prev_txid, delta.prev_index) {
                        (Some(prev_txid), Some(prev_index)) => {
                            if let Some(spent) = self.utxos.get(&wallet_id, &prev_txid, prev_index)? {
                                self.utxos.stage_remove(&mut txn, &spent);
                                undo.utxos_spent.push(spent);
                            }
                        }
                        _ => {
                            let utxo = Utxo {
                                wallet_id,
                                txid: delta.txid,
                                index: delta.index,
                                height: block.height,
                                satoshis: delta.satoshis,
                                address: *address,
                            };
                            self.utxos.stage_insert(&mut txn, &utxo)?;
                            undo.utxos_added.push(utxo);
                        }
                    }
                }
            }
        }

        for (wallet_id, slots) in &positions {
            let mut index = self.txids.get(wallet_id)?;
            for ((height, block_index), txid) in slots {
                index.insert(*height, *block_index, *txid)?;
                undo.txids_inserted.push((*wallet_id, *height, *block_index, *txid));
                self.txs.stage_invalidate(&mut txn, wallet_id, txid);
                undo.txs_invalidated.push((*wallet_id, *txid));
            }
            self.txids.stage_put(&mut txn, wallet_id, &index);
        }

        for (wallet_id, delta) in &balance_deltas {
            let mut wallet = self
                .wallets
                .get(wallet_id)?
                .ok_or(EngineError::WalletNotFound(*wallet_id))?;
            wallet.balance += delta;
            self.wallets.stage_put(&mut txn, &wallet)?;
            undo.balance_deltas.push((*wallet_id, *delta));
        }

        let record = BlockRecord {
            height: block.height,
            hash: block.hash,
            prev_hash: block.prev_hash,
            address_filter: global,
            undo,
        };
        self.blocks.stage_put(&mut txn, &record)?;
        self.metadata.stage_clear_pending_action(&mut txn);
        txn.commit(&self.db)?;
        Ok(record)
    }

    /// Reverses the current tip block exactly, using the undo data
    /// recorded when it was connected, and promotes the previous block
    /// record to tip.
    pub(crate) fn disconnect_tip(&self) -> EngineResult<()> {
        let tip = self
            .tip()
            .ok_or_else(|| EngineError::InvalidState("no tip to disconnect".to_string()))?;
        let record = self.blocks.get(tip.height)?.ok_or_else(|| {
            EngineError::InvalidState(format!("tip record missing at height {}", tip.height))
        })?;
        let prev = if tip.height > 1 {
            Some(self.blocks.get(tip.height - 1)?.ok_or_else(|| {
                EngineError::InvalidState(format!(
                    "reorg past retained history: no record at height {}",
                    tip.height - 1
                ))
            })?)
        } else {
            None
        };

        self.stage_action_marker(BlockAction::Disconnect, record.height, record.hash)?;
        match self.disconnect_tip_txn(&record) {
            Ok(()) => {
                *self.tip.write() = prev.as_ref().map(|r| Tip { height: r.height, hash: r.hash });
                info!(height = record.height, hash = %record.hash, "disconnected block");
                Ok(())
            }
            Err(e) => {
                self.clear_action_marker();
                Err(e)
            }
        }
    }

    fn disconnect_tip_txn(&self, record: &BlockRecord) -> EngineResult<()> {
        let mut txn = Txn::new();

        for utxo in &record.undo.utxos_added {
            self.utxos.stage_remove(&mut txn, utxo);
        }
        for utxo in &record.undo.utxos_spent {
            self.utxos.stage_insert(&mut txn, utxo)?;
        }

        let mut indexes: BTreeMap<WalletId, TxidIndex> = BTreeMap::new();
        for (wallet_id, height, block_index, txid) in &record.undo.txids_inserted {
            if !indexes.contains_key(wallet_id) {
                indexes.insert(*wallet_id, self.txids.get(wallet_id)?);
            }
            if let Some(index) = indexes.get_mut(wallet_id) {
                index.remove(*height, *block_index);
            }
            // Detail cached since the connect describes the abandoned
            // chain; drop it so readers re-fetch.
            self.txs.stage_invalidate(&mut txn, wallet_id, txid);
        }
        for (wallet_id, index) in &indexes {
            self.txids.stage_put(&mut txn, wallet_id, index);
        }

        for (wallet_id, delta) in &record.undo.balance_deltas {
            let mut wallet = self
                .wallets
                .get(wallet_id)?
                .ok_or(EngineError::WalletNotFound(*wallet_id))?;
            wallet.balance -= delta;
            self.wallets.stage_put(&mut txn, &wallet)?;
        }

        self.blocks.stage_delete(&mut txn, record.height);
        self.metadata.stage_clear_pending_action(&mut txn);
        txn.commit(&self.db)?;
        Ok(())
    }

    /// Commits the small pre-application marker that startup recovery
    /// looks for; the block's own commit clears it again.
    fn stage_action_marker(&self, action: BlockAction, height: u32, hash: BlockHash) -> EngineResult<()> {
        let mut marker = Txn::new();
        self.metadata
            .stage_pending_action(&mut marker, &PendingAction { action, height, hash })?;
        marker.commit(&self.db)?;
        Ok(())
    }

    /// The in-process failure path aborted before any effect became
    /// visible, so the marker must not survive to trigger recovery.
    fn clear_action_marker(&self) {
        let mut txn = Txn::new();
        self.metadata.stage_clear_pending_action(&mut txn);
        if let Err(e) = txn.commit(&self.db) {
            warn!(error = %e, "failed to clear block action marker");
        }
    }
}
