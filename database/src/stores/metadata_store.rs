use crate::db::CF_METADATA;
use crate::txn::Txn;
use crate::{Database, DbResult};
use indexer_core::{BlockHash, BloomFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const KEY_PENDING_ACTION: &[u8] = b"pending_action";
const KEY_ADDRESS_FILTER: &[u8] = b"address_filter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockAction {
    Connect,
    Disconnect,
}

/// Marker committed before a block is applied and cleared inside the
/// application's own commit; a marker found at startup means the
/// recorded action must be re-driven (or acknowledged) before serving
/// tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub action: BlockAction,
    pub height: u32,
    pub hash: BlockHash,
}

pub struct MetadataStore {
    db: Arc<Database>,
}

impl MetadataStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn pending_action(&self) -> DbResult<Option<PendingAction>> {
        match self.db.get(CF_METADATA, KEY_PENDING_ACTION)? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn stage_pending_action(&self, txn: &mut Txn, action: &PendingAction) -> DbResult<()> {
        txn.put(CF_METADATA, KEY_PENDING_ACTION.to_vec(), bincode::serialize(action)?);
        Ok(())
    }

    pub fn stage_clear_pending_action(&self, txn: &mut Txn) {
        txn.delete(CF_METADATA, KEY_PENDING_ACTION.to_vec());
    }

    /// The live filter over all addresses across all wallets. Kept here
    /// (not only in block records) so imports performed before the first
    /// sync survive a restart.
    pub fn address_filter(&self) -> DbResult<Option<BloomFilter>> {
        match self.db.get(CF_METADATA, KEY_ADDRESS_FILTER)? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn stage_address_filter(&self, txn: &mut Txn, filter: &BloomFilter) -> DbResult<()> {
        txn.put(CF_METADATA, KEY_ADDRESS_FILTER.to_vec(), bincode::serialize(filter)?);
        Ok(())
    }
}
