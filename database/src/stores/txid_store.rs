use crate::db::CF_TXIDS;
use crate::keys;
use crate::txn::Txn;
use crate::{Database, DbResult};
use indexer_core::{TxidIndex, WalletId};
use std::sync::Arc;

/// Loads and stores each wallet's sorted txid index blob.
pub struct TxidStore {
    db: Arc<Database>,
}

impl TxidStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// A wallet with no history gets an empty index.
    pub fn get(&self, wallet_id: &WalletId) -> DbResult<TxidIndex> {
        match self.db.get(CF_TXIDS, &keys::txid_index_key(wallet_id))? {
            Some(data) => Ok(TxidIndex::from_bytes(&data)?),
            None => Ok(TxidIndex::new()),
        }
    }

    pub fn stage_put(&self, txn: &mut Txn, wallet_id: &WalletId, index: &TxidIndex) {
        txn.put(CF_TXIDS, keys::txid_index_key(wallet_id), index.as_bytes());
    }
}
