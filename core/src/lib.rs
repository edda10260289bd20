//! Core domain types for the wallet index engine
//!
//! This crate defines the hash/identifier newtypes, address encoding,
//! block delta model, bloom filtering and the sorted per-wallet txid
//! index shared by the storage and engine crates.

pub mod address;
pub mod block_filter;
pub mod bloom;
pub mod delta;
pub mod errors;
pub mod hash;
pub mod records;
pub mod txid_index;

pub use address::{Address, AddressType};
pub use block_filter::filter_block_deltas;
pub use bloom::BloomFilter;
pub use delta::{AddressDelta, BlockDelta, InputDelta, OutputDelta, TxDelta};
pub use errors::{CoreError, CoreResult};
pub use hash::{BlockHash, Hash, Txid, WalletId, HASH_SIZE};
pub use records::{BlockRecord, BlockUndo, Utxo, Wallet};
pub use txid_index::{TxidEntry, TxidIndex, TXID_ENTRY_SIZE};
