pub mod address_store;
pub mod block_store;
pub mod metadata_store;
pub mod tx_store;
pub mod txid_store;
pub mod utxo_store;
pub mod wallet_store;

pub use address_store::AddressStore;
pub use block_store::BlockStore;
pub use metadata_store::{BlockAction, MetadataStore, PendingAction};
pub use tx_store::TxStore;
pub use txid_store::TxidStore;
pub use utxo_store::UtxoStore;
pub use wallet_store::WalletStore;
