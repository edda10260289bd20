use crate::errors::{DbError, DbResult};
use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::Path;
use std::sync::Arc;

pub const CF_WALLETS: &str = "wallets";
pub const CF_ADDRESSES: &str = "addresses";
pub const CF_ADDRESSES_MAP: &str = "addresses_map";
pub const CF_TXIDS: &str = "txids";
pub const CF_BLOCKS: &str = "blocks";
pub const CF_TXS: &str = "txs";
pub const CF_UTXOS: &str = "utxos";
pub const CF_UTXOS_BY_SATOSHIS: &str = "utxos_by_satoshis";
pub const CF_UTXOS_BY_HEIGHT: &str = "utxos_by_height";
pub const CF_METADATA: &str = "metadata";

pub const ALL_CFS: &[&str] = &[
    CF_WALLETS,
    CF_ADDRESSES,
    CF_ADDRESSES_MAP,
    CF_TXIDS,
    CF_BLOCKS,
    CF_TXS,
    CF_UTXOS,
    CF_UTXOS_BY_SATOSHIS,
    CF_UTXOS_BY_HEIGHT,
    CF_METADATA,
];

pub struct Database {
    db: Arc<DB>,
    is_closed: Arc<RwLock<bool>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(10000);
        opts.set_keep_log_file_num(10);
        opts.set_max_background_jobs(4);
        opts.set_bytes_per_sync(1048576);
        opts.increase_parallelism(4);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);

        let cf_descriptors: Vec<_> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        Ok(Self { db: Arc::new(db), is_closed: Arc::new(RwLock::new(false)) })
    }

    pub(crate) fn check_closed(&self) -> DbResult<()> {
        if *self.is_closed.read() { return Err(DbError::DatabaseClosed); }
        Ok(())
    }

    pub(crate) fn get_cf_handle(&self, cf_name: &str) -> DbResult<&rocksdb::ColumnFamily> {
        self.db.cf_handle(cf_name)
            .ok_or_else(|| DbError::ColumnFamilyNotFound(cf_name.to_string()))
    }

    pub fn put(&self, cf_name: &str, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        self.db.put_cf(cf, key, value)?;
        Ok(())
    }

    pub fn get(&self, cf_name: &str, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        Ok(self.db.get_cf(cf, key)?)
    }

    pub fn delete(&self, cf_name: &str, key: &[u8]) -> DbResult<()> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        self.db.delete_cf(cf, key)?;
        Ok(())
    }

    pub fn exists(&self, cf_name: &str, key: &[u8]) -> DbResult<bool> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        Ok(self.db.get_pinned_cf(cf, key)?.is_some())
    }

    /// Writes a batch with a durability sync; used by `Txn::commit`.
    pub fn write_batch_sync(&self, batch: WriteBatch) -> DbResult<()> {
        self.check_closed()?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(true);
        self.db.write_opt(batch, &write_opts)?;
        Ok(())
    }

    pub fn iterator(&self, cf_name: &str, mode: IteratorMode) -> DbResult<rocksdb::DBIteratorWithThreadMode<'_, DB>> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        Ok(self.db.iterator_cf(cf, mode))
    }

    /// Forward iteration starting at `from`; callers bound the scan
    /// themselves since column families carry mixed prefixes.
    pub fn iterator_from(&self, cf_name: &str, from: &[u8]) -> DbResult<rocksdb::DBIteratorWithThreadMode<'_, DB>> {
        self.check_closed()?;
        let cf = self.get_cf_handle(cf_name)?;
        Ok(self.db.iterator_cf(cf, IteratorMode::From(from, Direction::Forward)))
    }

    pub fn close(&self) {
        *self.is_closed.write() = true;
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), is_closed: self.is_closed.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_database_open_put_get() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        db.put(CF_WALLETS, b"k", b"v").unwrap();
        let v = db.get(CF_WALLETS, b"k").unwrap();
        assert_eq!(v, Some(b"v".to_vec()));
    }

    #[test]
    fn test_closed_database_rejects_ops() {
        let tmp = TempDir::new().unwrap();
        let db = Database::open(tmp.path()).unwrap();
        db.close();
        assert!(matches!(db.put(CF_WALLETS, b"k", b"v"), Err(DbError::DatabaseClosed)));
    }
}
