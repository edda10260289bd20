use crate::db::{CF_UTXOS, CF_UTXOS_BY_HEIGHT, CF_UTXOS_BY_SATOSHIS};
use crate::keys;
use crate::txn::Txn;
use crate::{Database, DbResult};
use indexer_core::{Txid, Utxo, WalletId};
use std::sync::Arc;

/// Maintains the three projections of the unspent-output set: by
/// identity, by value and by confirmation height. Inserts and removals
/// always stage all three keys in the same transaction so the
/// projections cannot drift apart.
pub struct UtxoStore {
    db: Arc<Database>,
}

impl UtxoStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get(&self, wallet_id: &WalletId, txid: &Txid, index: u32) -> DbResult<Option<Utxo>> {
        match self.db.get(CF_UTXOS, &keys::utxo_key(wallet_id, txid, index))? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn stage_insert(&self, txn: &mut Txn, utxo: &Utxo) -> DbResult<()> {
        let serialized = bincode::serialize(utxo)?;
        txn.put(CF_UTXOS, keys::utxo_key(&utxo.wallet_id, &utxo.txid, utxo.index), serialized.clone());
        txn.put(
            CF_UTXOS_BY_SATOSHIS,
            keys::utxo_by_satoshis_key(&utxo.wallet_id, utxo.satoshis, &utxo.txid, utxo.index),
            serialized.clone(),
        );
        txn.put(
            CF_UTXOS_BY_HEIGHT,
            keys::utxo_by_height_key(&utxo.wallet_id, utxo.height, &utxo.txid, utxo.index),
            serialized,
        );
        Ok(())
    }

    /// Takes the full record (not just the outpoint) because the value
    /// and height projections need their key components.
    pub fn stage_remove(&self, txn: &mut Txn, utxo: &Utxo) {
        txn.delete(CF_UTXOS, keys::utxo_key(&utxo.wallet_id, &utxo.txid, utxo.index));
        txn.delete(
            CF_UTXOS_BY_SATOSHIS,
            keys::utxo_by_satoshis_key(&utxo.wallet_id, utxo.satoshis, &utxo.txid, utxo.index),
        );
        txn.delete(
            CF_UTXOS_BY_HEIGHT,
            keys::utxo_by_height_key(&utxo.wallet_id, utxo.height, &utxo.txid, utxo.index),
        );
    }

    pub fn by_wallet(&self, wallet_id: &WalletId) -> DbResult<Vec<Utxo>> {
        self.scan(CF_UTXOS, wallet_id.as_bytes())
    }

    /// All of a wallet's UTXOs in ascending value order.
    pub fn by_satoshis(&self, wallet_id: &WalletId) -> DbResult<Vec<Utxo>> {
        self.scan(CF_UTXOS_BY_SATOSHIS, wallet_id.as_bytes())
    }

    /// All of a wallet's UTXOs in ascending confirmation-height order.
    pub fn by_height(&self, wallet_id: &WalletId) -> DbResult<Vec<Utxo>> {
        self.scan(CF_UTXOS_BY_HEIGHT, wallet_id.as_bytes())
    }

    fn scan(&self, cf: &'static str, prefix: &[u8]) -> DbResult<Vec<Utxo>> {
        let mut out = Vec::new();
        for item in self.db.iterator_from(cf, prefix)? {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push(bincode::deserialize(&value)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_core::{Address, AddressType, Hash};
    use tempfile::TempDir;

    fn utxo(wallet: u64, txid: u64, index: u32, height: u32, satoshis: i64) -> Utxo {
        Utxo {
            wallet_id: WalletId::from_u64_word(wallet),
            txid: Hash::from_u64_word(txid),
            index,
            height,
            satoshis,
            address: Address::new(AddressType::PayToPublicKeyHash, [1; 20]),
        }
    }

    fn setup() -> (TempDir, Arc<Database>, UtxoStore) {
        let tmp = TempDir::new().unwrap();
        let db = Arc::new(Database::open(tmp.path()).unwrap());
        let store = UtxoStore::new(db.clone());
        (tmp, db, store)
    }

    #[test]
    fn projections_stay_consistent() {
        let (_tmp, db, store) = setup();
        let u = utxo(1, 10, 0, 100, 5_000);

        let mut txn = Txn::new();
        store.stage_insert(&mut txn, &u).unwrap();
        txn.commit(&db).unwrap();

        let wallet = u.wallet_id;
        assert_eq!(store.get(&wallet, &u.txid, 0).unwrap(), Some(u.clone()));
        assert_eq!(store.by_satoshis(&wallet).unwrap(), vec![u.clone()]);
        assert_eq!(store.by_height(&wallet).unwrap(), vec![u.clone()]);

        let mut txn = Txn::new();
        store.stage_remove(&mut txn, &u);
        txn.commit(&db).unwrap();

        assert_eq!(store.get(&wallet, &u.txid, 0).unwrap(), None);
        assert!(store.by_satoshis(&wallet).unwrap().is_empty());
        assert!(store.by_height(&wallet).unwrap().is_empty());
    }

    #[test]
    fn value_and_height_orderings() {
        let (_tmp, db, store) = setup();
        let small_late = utxo(1, 10, 0, 300, 1_000);
        let large_early = utxo(1, 11, 0, 100, 90_000);

        let mut txn = Txn::new();
        store.stage_insert(&mut txn, &small_late).unwrap();
        store.stage_insert(&mut txn, &large_early).unwrap();
        txn.commit(&db).unwrap();

        let wallet = small_late.wallet_id;
        let by_value: Vec<i64> = store.by_satoshis(&wallet).unwrap().iter().map(|u| u.satoshis).collect();
        assert_eq!(by_value, vec![1_000, 90_000]);
        let by_height: Vec<u32> = store.by_height(&wallet).unwrap().iter().map(|u| u.height).collect();
        assert_eq!(by_height, vec![100, 300]);
    }

    #[test]
    fn scans_do_not_cross_wallets() {
        let (_tmp, db, store) = setup();
        let mine = utxo(1, 10, 0, 100, 5_000);
        let theirs = utxo(2, 11, 0, 100, 7_000);

        let mut txn = Txn::new();
        store.stage_insert(&mut txn, &mine).unwrap();
        store.stage_insert(&mut txn, &theirs).unwrap();
        txn.commit(&db).unwrap();

        assert_eq!(store.by_wallet(&mine.wallet_id).unwrap(), vec![mine]);
    }
}
