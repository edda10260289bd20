use crate::db::CF_TXS;
use crate::keys;
use crate::txn::Txn;
use crate::{Database, DbResult};
use indexer_core::{Txid, WalletId};
use std::sync::Arc;

/// Cached detailed transaction payloads keyed by (wallet, txid). The
/// payload is opaque JSON bytes; the engine invalidates an entry
/// whenever the txid is (re)inserted so readers re-fetch fresh detail.
pub struct TxStore {
    db: Arc<Database>,
}

impl TxStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get(&self, wallet_id: &WalletId, txid: &Txid) -> DbResult<Option<Vec<u8>>> {
        self.db.get(CF_TXS, &keys::tx_key(wallet_id, txid))
    }

    pub fn stage_put(&self, txn: &mut Txn, wallet_id: &WalletId, txid: &Txid, detail: Vec<u8>) {
        txn.put(CF_TXS, keys::tx_key(wallet_id, txid), detail);
    }

    pub fn stage_invalidate(&self, txn: &mut Txn, wallet_id: &WalletId, txid: &Txid) {
        txn.delete(CF_TXS, keys::tx_key(wallet_id, txid));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_core::Hash;
    use tempfile::TempDir;

    #[test]
    fn save_and_invalidate() {
        let tmp = TempDir::new().unwrap();
        let db = Arc::new(Database::open(tmp.path()).unwrap());
        let store = TxStore::new(db.clone());
        let wallet = WalletId::from_u64_word(1);
        let txid = Hash::from_u64_word(2);

        let mut txn = Txn::new();
        store.stage_put(&mut txn, &wallet, &txid, b"{\"txid\":\"..\"}".to_vec());
        txn.commit(&db).unwrap();
        assert!(store.get(&wallet, &txid).unwrap().is_some());

        let mut txn = Txn::new();
        store.stage_invalidate(&mut txn, &wallet, &txid);
        txn.commit(&db).unwrap();
        assert!(store.get(&wallet, &txid).unwrap().is_none());
    }
}
