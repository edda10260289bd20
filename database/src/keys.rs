//! Fixed-width binary key encodings.
//!
//! All multi-byte integers are big-endian so that rocksdb's
//! lexicographic iteration order matches each table's required sort
//! order.

use indexer_core::{Address, Txid, WalletId};

pub fn wallet_key(id: &WalletId) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// `wallet_id ‖ type_byte ‖ address_hash`
pub fn address_key(wallet_id: &WalletId, address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 1 + 20);
    key.extend_from_slice(wallet_id.as_bytes());
    key.push(address.addr_type.discriminant());
    key.extend_from_slice(&address.hash);
    key
}

/// `type_byte ‖ address_hash`
pub fn address_map_key(address: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + 20);
    key.push(address.addr_type.discriminant());
    key.extend_from_slice(&address.hash);
    key
}

pub fn txid_index_key(wallet_id: &WalletId) -> Vec<u8> {
    wallet_id.as_bytes().to_vec()
}

pub fn block_key(height: u32) -> Vec<u8> {
    height.to_be_bytes().to_vec()
}

pub fn decode_block_key(key: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(key.try_into().ok()?))
}

/// `wallet_id ‖ txid`
pub fn tx_key(wallet_id: &WalletId, txid: &Txid) -> Vec<u8> {
    let mut key = Vec::with_capacity(64);
    key.extend_from_slice(wallet_id.as_bytes());
    key.extend_from_slice(txid.as_bytes());
    key
}

/// `wallet_id ‖ txid ‖ index`
pub fn utxo_key(wallet_id: &WalletId, txid: &Txid, index: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 32 + 4);
    key.extend_from_slice(wallet_id.as_bytes());
    key.extend_from_slice(txid.as_bytes());
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// `wallet_id ‖ satoshis ‖ txid ‖ index`
pub fn utxo_by_satoshis_key(wallet_id: &WalletId, satoshis: i64, txid: &Txid, index: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 8 + 32 + 4);
    key.extend_from_slice(wallet_id.as_bytes());
    // UTXO values are non-negative; encode as u64 so ordering is by value.
    key.extend_from_slice(&(satoshis.max(0) as u64).to_be_bytes());
    key.extend_from_slice(txid.as_bytes());
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// `wallet_id ‖ height ‖ txid ‖ index`
pub fn utxo_by_height_key(wallet_id: &WalletId, height: u32, txid: &Txid, index: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(32 + 4 + 32 + 4);
    key.extend_from_slice(wallet_id.as_bytes());
    key.extend_from_slice(&height.to_be_bytes());
    key.extend_from_slice(txid.as_bytes());
    key.extend_from_slice(&index.to_be_bytes());
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_core::{AddressType, Hash};

    #[test]
    fn satoshis_keys_sort_by_value() {
        let wallet = WalletId::from_u64_word(1);
        let txid = Hash::from_u64_word(9);
        let small = utxo_by_satoshis_key(&wallet, 100, &txid, 0);
        let large = utxo_by_satoshis_key(&wallet, 70_000, &txid, 0);
        assert!(small < large);
    }

    #[test]
    fn height_keys_sort_by_height() {
        let wallet = WalletId::from_u64_word(1);
        let txid = Hash::from_u64_word(9);
        let low = utxo_by_height_key(&wallet, 5, &txid, 0);
        let high = utxo_by_height_key(&wallet, 300, &txid, 0);
        assert!(low < high);
    }

    #[test]
    fn block_key_round_trip() {
        assert_eq!(decode_block_key(&block_key(481_824)), Some(481_824));
        assert!(decode_block_key(b"bad").is_none());
    }

    #[test]
    fn address_key_embeds_type_discriminant() {
        let wallet = WalletId::from_u64_word(1);
        let p2pkh = Address::new(AddressType::PayToPublicKeyHash, [1; 20]);
        let p2sh = Address::new(AddressType::PayToScriptHash, [1; 20]);
        assert_ne!(address_key(&wallet, &p2pkh), address_key(&wallet, &p2sh));
    }
}
