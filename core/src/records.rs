use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::bloom::BloomFilter;
use crate::hash::{BlockHash, Txid, WalletId};

/// Durable per-wallet record: running balance plus the bloom filter over
/// this wallet's own address hashes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub balance: i64,
    pub address_filter: BloomFilter,
}

impl Wallet {
    pub fn new(id: WalletId, address_filter: BloomFilter) -> Self {
        Self { id, balance: 0, address_filter }
    }
}

/// One unspent output owned by a wallet. The same fact is projected into
/// three tables (by identity, by value, by height); instances are always
/// created and deleted across all three together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub wallet_id: WalletId,
    pub txid: Txid,
    pub index: u32,
    pub height: u32,
    pub satoshis: i64,
    pub address: Address,
}

/// Everything needed to reverse one connected block exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockUndo {
    /// (wallet, height, block index, txid) entries inserted by this block.
    pub txids_inserted: Vec<(WalletId, u32, u32, Txid)>,
    pub utxos_added: Vec<Utxo>,
    /// Spent outputs removed by this block, kept whole so disconnect can
    /// restore them.
    pub utxos_spent: Vec<Utxo>,
    pub balance_deltas: Vec<(WalletId, i64)>,
    /// Cached transaction details deleted when a txid was (re)inserted.
    pub txs_invalidated: Vec<(WalletId, Txid)>,
}

impl BlockUndo {
    pub fn is_empty(&self) -> bool {
        self.txids_inserted.is_empty()
            && self.utxos_added.is_empty()
            && self.utxos_spent.is_empty()
            && self.balance_deltas.is_empty()
    }
}

/// Chain-tip cursor for the whole index. The record at the greatest
/// height is the current tip; older records are retained up to the prune
/// depth so reorgs can roll back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub height: u32,
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    /// Snapshot of the filter over all addresses across all wallets, as
    /// of this block.
    pub address_filter: BloomFilter,
    pub undo: BlockUndo,
}
