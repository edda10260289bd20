use crate::db::{CF_ADDRESSES, CF_ADDRESSES_MAP};
use crate::keys;
use crate::txn::Txn;
use crate::{Database, DbResult};
use indexer_core::{Address, WalletId};
use std::sync::Arc;

/// Owned-address existence records plus the address → wallets fan-out
/// map. The existence record is the authoritative answer that rejects
/// bloom filter false positives.
pub struct AddressStore {
    db: Arc<Database>,
}

impl AddressStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn contains(&self, wallet_id: &WalletId, address: &Address) -> DbResult<bool> {
        self.db.exists(CF_ADDRESSES, &keys::address_key(wallet_id, address))
    }

    pub fn stage_insert(&self, txn: &mut Txn, wallet_id: &WalletId, address: &Address) {
        txn.put(CF_ADDRESSES, keys::address_key(wallet_id, address), Vec::new());
    }

    /// Every wallet that owns this address, in id order.
    pub fn wallets_for_address(&self, address: &Address) -> DbResult<Vec<WalletId>> {
        match self.db.get(CF_ADDRESSES_MAP, &keys::address_map_key(address))? {
            Some(data) => Ok(bincode::deserialize(&data)?),
            None => Ok(Vec::new()),
        }
    }

    /// Stages the fan-out entry with `wallet_id` merged in (sorted,
    /// deduplicated) and returns the merged set.
    pub fn stage_map_insert(&self, txn: &mut Txn, address: &Address, wallet_id: &WalletId) -> DbResult<Vec<WalletId>> {
        let mut owners = self.wallets_for_address(address)?;
        if let Err(pos) = owners.binary_search(wallet_id) {
            owners.insert(pos, *wallet_id);
        }
        txn.put(CF_ADDRESSES_MAP, keys::address_map_key(address), bincode::serialize(&owners)?);
        Ok(owners)
    }
}
