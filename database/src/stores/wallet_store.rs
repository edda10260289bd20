use crate::cache::WriteThroughCache;
use crate::db::CF_WALLETS;
use crate::keys;
use crate::txn::Txn;
use crate::{Database, DbResult};
use indexer_core::{Wallet, WalletId};
use std::sync::Arc;

pub struct WalletStore {
    db: Arc<Database>,
    cache: WriteThroughCache<WalletId, Wallet>,
}

impl WalletStore {
    pub fn new(db: Arc<Database>, cache_size: usize) -> Self {
        Self { db, cache: WriteThroughCache::new(cache_size) }
    }

    pub fn get(&self, id: &WalletId) -> DbResult<Option<Wallet>> {
        if let Some(w) = self.cache.get(id) {
            return Ok(Some(w));
        }
        if let Some(data) = self.db.get(CF_WALLETS, &keys::wallet_key(id))? {
            let wallet: Wallet = bincode::deserialize(&data)?;
            self.cache.insert(*id, wallet.clone());
            Ok(Some(wallet))
        } else {
            Ok(None)
        }
    }

    pub fn exists(&self, id: &WalletId) -> DbResult<bool> {
        if self.cache.get(id).is_some() {
            return Ok(true);
        }
        self.db.exists(CF_WALLETS, &keys::wallet_key(id))
    }

    /// Stages the record and drops the cached copy; the next read after
    /// commit (or abort) reloads whatever actually got committed.
    pub fn stage_put(&self, txn: &mut Txn, wallet: &Wallet) -> DbResult<()> {
        let serialized = bincode::serialize(wallet)?;
        txn.put(CF_WALLETS, keys::wallet_key(&wallet.id), serialized);
        self.cache.remove(&wallet.id);
        Ok(())
    }
}
