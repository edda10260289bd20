use database::stores::BlockAction;
use database::Txn;
use tracing::{info, warn};

use crate::engine::Engine;
use crate::errors::{EngineError, EngineResult};

impl Engine {
    /// Startup path: if a previous run crashed between committing a
    /// block action marker and committing the block itself, the action
    /// is re-driven to completion before any task is served. A marker
    /// whose effects already landed is simply cleared.
    pub async fn recover(&self) -> EngineResult<()> {
        let Some(pending) = self.metadata.pending_action()? else {
            return Ok(());
        };
        warn!(
            action = ?pending.action,
            height = pending.height,
            hash = %pending.hash,
            "found unfinished block action, recovering"
        );

        match pending.action {
            BlockAction::Connect => {
                match self.blocks.get(pending.height)? {
                    Some(record) if record.hash == pending.hash => {
                        // The commit landed; only the marker was left behind.
                        self.clear_marker()?;
                    }
                    _ => {
                        let tip_height = self.tip().map_or(0, |t| t.height);
                        if tip_height + 1 != pending.height {
                            return Err(EngineError::InvalidState(format!(
                                "pending connect at height {} does not follow tip {}",
                                pending.height, tip_height
                            )));
                        }
                        let block = self.node.get_block_deltas(pending.hash).await?;
                        self.connect_block(&block)?;
                        info!(height = pending.height, "re-drove interrupted connect");
                    }
                }
            }
            BlockAction::Disconnect => {
                match self.tip() {
                    Some(t) if t.height == pending.height && t.hash == pending.hash => {
                        self.disconnect_tip()?;
                        info!(height = pending.height, "re-drove interrupted disconnect");
                    }
                    _ => {
                        // The tip record is already gone; the disconnect
                        // committed before the crash.
                        self.clear_marker()?;
                    }
                }
            }
        }
        Ok(())
    }

    fn clear_marker(&self) -> EngineResult<()> {
        let mut txn = Txn::new();
        self.metadata.stage_clear_pending_action(&mut txn);
        txn.commit(&self.db)?;
        Ok(())
    }
}
