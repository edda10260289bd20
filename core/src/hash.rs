use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CoreError;

pub const HASH_SIZE: usize = 32;

/// A 32-byte hash wrapper used across the project.
///
/// Serialized as a lowercase hex string so the same representation works
/// for the JSON wire protocol and the bincode record encoding.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_SIZE]);

/// Transaction identifier.
pub type Txid = Hash;
/// Block identifier.
pub type BlockHash = Hash;

impl Hash {
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn zeroed() -> Self {
        Self([0u8; HASH_SIZE])
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CoreError> {
        let array: [u8; HASH_SIZE] = slice
            .try_into()
            .map_err(|_| CoreError::InvalidHash(format!("expected {} bytes, got {}", HASH_SIZE, slice.len())))?;
        Ok(Self(array))
    }

    /// Constructs a hash from a single little-endian u64 word (used in tests).
    pub fn from_u64_word(word: u64) -> Self {
        let mut bytes = [0u8; HASH_SIZE];
        bytes[..8].copy_from_slice(&word.to_le_bytes());
        Self(bytes)
    }
}

impl From<[u8; HASH_SIZE]> for Hash {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for Hash {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| CoreError::InvalidHash(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", hex::encode(self.0))
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte wallet identifier, distinct from block/transaction hashes.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletId([u8; HASH_SIZE]);

impl WalletId {
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, CoreError> {
        Ok(Self(*Hash::from_slice(slice)?.as_bytes()))
    }

    pub fn from_u64_word(word: u64) -> Self {
        Self(*Hash::from_u64_word(word).as_bytes())
    }
}

impl AsRef<[u8]> for WalletId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for WalletId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(*Hash::from_str(s)?.as_bytes()))
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletId({})", hex::encode(self.0))
    }
}

impl Serialize for WalletId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for WalletId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
