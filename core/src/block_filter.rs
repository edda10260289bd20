use std::collections::BTreeMap;

use crate::address::Address;
use crate::bloom::BloomFilter;
use crate::delta::{AddressDelta, BlockDelta};

/// Narrows a raw block down to the deltas that may concern watched
/// addresses, grouped by address.
///
/// This is a cheap, lossy pre-filter: bloom false positives are expected
/// here and must be rejected by the caller against the durable address
/// records before anything is written. Addresses that fail to parse are
/// skipped; they can never have been imported.
pub fn filter_block_deltas(block: &BlockDelta, filter: &BloomFilter) -> BTreeMap<Address, Vec<AddressDelta>> {
    let mut matched: BTreeMap<Address, Vec<AddressDelta>> = BTreeMap::new();

    for tx in &block.deltas {
        for output in &tx.outputs {
            let Ok(address) = output.address.parse::<Address>() else {
                continue;
            };
            if !filter.contains(&address.hash) {
                continue;
            }
            matched.entry(address).or_default().push(AddressDelta {
                txid: tx.txid,
                height: block.height,
                block_index: tx.block_index,
                index: output.index,
                satoshis: output.satoshis,
                prev_txid: None,
                prev_index: None,
            });
        }
        for input in &tx.inputs {
            let Ok(address) = input.address.parse::<Address>() else {
                continue;
            };
            if !filter.contains(&address.hash) {
                continue;
            }
            matched.entry(address).or_default().push(AddressDelta {
                txid: tx.txid,
                height: block.height,
                block_index: tx.block_index,
                index: input.index,
                satoshis: input.satoshis,
                prev_txid: Some(input.prev_txid),
                prev_index: Some(input.prev_index),
            });
        }
    }

    matched
}
