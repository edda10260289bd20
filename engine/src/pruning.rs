use database::Txn;
use tracing::debug;

use crate::engine::Engine;
use crate::errors::EngineResult;

impl Engine {
    /// Deletes retired block records once the retained depth is
    /// exceeded: oldest first, stopping at the first record at or above
    /// the prune threshold. Returns cleanly when nothing qualifies.
    pub(crate) fn prune_retired_blocks(&self, tip_height: u32) -> EngineResult<()> {
        let Some(threshold) = tip_height.checked_sub(self.config.prune_depth) else {
            return Ok(());
        };
        let heights = self.blocks.heights_below(threshold)?;
        if heights.is_empty() {
            return Ok(());
        }

        let mut txn = Txn::new();
        for height in &heights {
            self.blocks.stage_delete(&mut txn, *height);
        }
        txn.commit(&self.db)?;
        debug!(count = heights.len(), threshold, "pruned retired block records");
        Ok(())
    }
}
