use std::collections::{BTreeMap, BTreeSet};

use database::Txn;
use indexer_core::{Address, Txid, Utxo, WalletId};
use serde_json::{json, Value};
use tracing::info;

use crate::engine::Engine;
use crate::errors::{EngineError, EngineResult};

impl Engine {
    /// Registers new addresses for a wallet and backfills their history
    /// and UTXOs from the node, all applied in one commit.
    ///
    /// Shares the busy guard with sync. The node's reported chain tip
    /// must match the wallet tip on every response; a mismatch means the
    /// chain moved mid-import and nothing is applied.
    pub async fn import_wallet_addresses(
        &self,
        wallet_id: WalletId,
        addresses: Vec<Address>,
    ) -> EngineResult<Value> {
        let _guard = self.busy.try_acquire().ok_or(EngineError::Busy)?;

        let mut wallet = self
            .wallets
            .get(&wallet_id)?
            .ok_or(EngineError::WalletNotFound(wallet_id))?;

        let mut new_addresses = Vec::new();
        let mut seen = BTreeSet::new();
        for address in addresses {
            if seen.insert(address) && !self.addresses.contains(&wallet_id, &address)? {
                new_addresses.push(address);
            }
        }
        if new_addresses.is_empty() {
            return Ok(json!({ "imported": 0 }));
        }

        let tip = self.tip();
        let mut txn = Txn::new();
        let mut index = self.txids.get(&wallet_id)?;
        let mut balance_delta = 0i64;

        if let Some(t) = &tip {
            let strings: Vec<String> = new_addresses.iter().map(|a| a.to_string()).collect();

            // History over [1, tip], chunked to respect remote limits.
            let mut positions: BTreeMap<(u32, u32), Txid> = BTreeMap::new();
            let chunk = self.config.import_chunk_size.max(1);
            let mut start = 1u32;
            while start <= t.height {
                let end = start.saturating_add(chunk - 1).min(t.height);
                let response = self.node.get_address_deltas(&strings, start, end).await?;
                if response.tip_height != t.height || response.tip_hash != t.hash {
                    return Err(EngineError::ChainMoved { expected: t.hash, actual: response.tip_hash });
                }
                for delta in response.deltas {
                    balance_delta += delta.satoshis;
                    if let Some(existing) = positions.insert((delta.height, delta.block_index), delta.txid) {
                        if existing != delta.txid {
                            return Err(EngineError::InvalidState(format!(
                                "two txids claim position ({}, {})",
                                delta.height, delta.block_index
                            )));
                        }
                    }
                }
                match end.checked_add(1) {
                    Some(next) => start = next,
                    None => break,
                }
            }

            for ((height, block_index), txid) in &positions {
                match index.get(*height, *block_index) {
                    // Already indexed through a previously imported
                    // address participating in the same transaction.
                    Some(existing) if existing == *txid => {}
                    Some(_) => {
                        return Err(indexer_core::CoreError::DuplicatePosition {
                            height: *height,
                            block_index: *block_index,
                        }
                        .into())
                    }
                    None => {
                        index.insert(*height, *block_index, *txid)?;
                        self.txs.stage_invalidate(&mut txn, &wallet_id, txid);
                    }
                }
            }

            let utxo_response = self.node.get_address_utxos(&strings).await?;
            if utxo_response.tip_height != t.height || utxo_response.tip_hash != t.hash {
                return Err(EngineError::ChainMoved { expected: t.hash, actual: utxo_response.tip_hash });
            }
            for u in utxo_response.utxos {
                let address: Address = u
                    .address
                    .parse()
                    .map_err(|e| EngineError::InvalidState(format!("node returned bad address: {}", e)))?;
                let utxo = Utxo {
                    wallet_id,
                    txid: u.txid,
                    index: u.index,
                    height: u.height,
                    satoshis: u.satoshis,
                    address,
                };
                self.utxos.stage_insert(&mut txn, &utxo)?;
            }
        }

        let mut global = self.global_filter.read().clone();
        for address in &new_addresses {
            self.addresses.stage_insert(&mut txn, &wallet_id, address);
            self.addresses.stage_map_insert(&mut txn, address, &wallet_id)?;
            wallet.address_filter.insert(&address.hash);
            global.insert(&address.hash);
        }
        wallet.balance += balance_delta;
        self.wallets.stage_put(&mut txn, &wallet)?;
        self.txids.stage_put(&mut txn, &wallet_id, &index);
        self.metadata.stage_address_filter(&mut txn, &global)?;
        txn.commit(&self.db)?;
        *self.global_filter.write() = global;

        info!(wallet = %wallet_id, count = new_addresses.len(), "imported wallet addresses");
        Ok(json!({ "imported": new_addresses.len() }))
    }
}
