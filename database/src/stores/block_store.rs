use crate::db::CF_BLOCKS;
use crate::keys;
use crate::txn::Txn;
use crate::{Database, DbResult};
use indexer_core::BlockRecord;
use rocksdb::IteratorMode;
use std::sync::Arc;

/// Chain-tip cursor records keyed by big-endian height. The record at
/// the greatest height is the current tip; history is retained up to the
/// prune depth for reorg rollback.
pub struct BlockStore {
    db: Arc<Database>,
}

impl BlockStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn get(&self, height: u32) -> DbResult<Option<BlockRecord>> {
        match self.db.get(CF_BLOCKS, &keys::block_key(height))? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    /// The record at the greatest retained height, if any.
    pub fn tip(&self) -> DbResult<Option<BlockRecord>> {
        let mut iter = self.db.iterator(CF_BLOCKS, IteratorMode::End)?;
        match iter.next() {
            Some(item) => {
                let (_key, value) = item?;
                Ok(Some(bincode::deserialize(&value)?))
            }
            None => Ok(None),
        }
    }

    pub fn stage_put(&self, txn: &mut Txn, record: &BlockRecord) -> DbResult<()> {
        let serialized = bincode::serialize(record)?;
        txn.put(CF_BLOCKS, keys::block_key(record.height), serialized);
        Ok(())
    }

    pub fn stage_delete(&self, txn: &mut Txn, height: u32) {
        txn.delete(CF_BLOCKS, keys::block_key(height));
    }

    /// Retained heights strictly below `threshold`, oldest first. The
    /// scan stops at the first record whose height does not qualify.
    pub fn heights_below(&self, threshold: u32) -> DbResult<Vec<u32>> {
        let mut heights = Vec::new();
        let iter = self.db.iterator(CF_BLOCKS, IteratorMode::Start)?;
        for item in iter {
            let (key, _value) = item?;
            let height = keys::decode_block_key(&key)
                .ok_or_else(|| crate::DbError::InvalidData(format!("bad block key length {}", key.len())))?;
            if height >= threshold {
                break;
            }
            heights.push(height);
        }
        Ok(heights)
    }
}
