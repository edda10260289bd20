use rocksdb::WriteBatch;
use tracing::trace;

use crate::db::Database;
use crate::errors::DbResult;

enum StagedOp {
    Put { cf: &'static str, key: Vec<u8>, value: Vec<u8> },
    Delete { cf: &'static str, key: Vec<u8> },
}

/// A staged mutation set applied atomically with a durability sync.
///
/// Nothing touches the database until `commit`; dropping (or calling
/// `abort`) discards every staged write, so a failed operation leaves
/// the previously committed state untouched.
#[derive(Default)]
pub struct Txn {
    ops: Vec<StagedOp>,
}

impl Txn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, cf: &'static str, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(StagedOp::Put { cf, key, value });
    }

    pub fn delete(&mut self, cf: &'static str, key: Vec<u8>) {
        self.ops.push(StagedOp::Delete { cf, key });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn commit(self, db: &Database) -> DbResult<()> {
        db.check_closed()?;
        let mut batch = WriteBatch::default();
        let op_count = self.ops.len();
        for op in self.ops {
            match op {
                StagedOp::Put { cf, key, value } => {
                    let handle = db.get_cf_handle(cf)?;
                    batch.put_cf(handle, key, value);
                }
                StagedOp::Delete { cf, key } => {
                    let handle = db.get_cf_handle(cf)?;
                    batch.delete_cf(handle, key);
                }
            }
        }
        db.write_batch_sync(batch)?;
        trace!(ops = op_count, "committed transaction");
        Ok(())
    }

    pub fn abort(self) {
        trace!(ops = self.ops.len(), "aborted transaction");
    }
}
