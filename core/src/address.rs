use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::errors::CoreError;

pub const ADDRESS_HASH_SIZE: usize = 20;

const VERSION_P2PKH: u8 = 0x00;
const VERSION_P2SH: u8 = 0x05;

/// Script template of a watched address, with a stable one-byte
/// discriminator used in storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressType {
    PayToPublicKeyHash,
    PayToScriptHash,
}

impl AddressType {
    pub fn discriminant(&self) -> u8 {
        match self {
            AddressType::PayToPublicKeyHash => 1,
            AddressType::PayToScriptHash => 2,
        }
    }

    pub fn from_discriminant(byte: u8) -> Result<Self, CoreError> {
        match byte {
            1 => Ok(AddressType::PayToPublicKeyHash),
            2 => Ok(AddressType::PayToScriptHash),
            other => Err(CoreError::InvalidEncoding(format!("unknown address type {}", other))),
        }
    }

    fn version_byte(&self) -> u8 {
        match self {
            AddressType::PayToPublicKeyHash => VERSION_P2PKH,
            AddressType::PayToScriptHash => VERSION_P2SH,
        }
    }

    fn from_version_byte(byte: u8) -> Result<Self, CoreError> {
        match byte {
            VERSION_P2PKH => Ok(AddressType::PayToPublicKeyHash),
            VERSION_P2SH => Ok(AddressType::PayToScriptHash),
            other => Err(CoreError::InvalidAddress(format!("unknown version byte {:#04x}", other))),
        }
    }
}

/// A watched address: script type plus the 20-byte payload hash.
///
/// The payload hash is what gets inserted into bloom filters and storage
/// keys; the base58check string form is only used at the API boundary.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub addr_type: AddressType,
    pub hash: [u8; ADDRESS_HASH_SIZE],
}

impl Address {
    pub fn new(addr_type: AddressType, hash: [u8; ADDRESS_HASH_SIZE]) -> Self {
        Self { addr_type, hash }
    }
}

fn checksum(payload: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[..4]);
    out
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CoreError::InvalidAddress(e.to_string()))?;
        if bytes.len() != 1 + ADDRESS_HASH_SIZE + 4 {
            return Err(CoreError::InvalidAddress(format!("bad payload length {}", bytes.len())));
        }
        let (payload, check) = bytes.split_at(1 + ADDRESS_HASH_SIZE);
        if checksum(payload).as_slice() != check {
            return Err(CoreError::InvalidAddress("checksum mismatch".to_string()));
        }
        let addr_type = AddressType::from_version_byte(payload[0])?;
        let mut hash = [0u8; ADDRESS_HASH_SIZE];
        hash.copy_from_slice(&payload[1..]);
        Ok(Self { addr_type, hash })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(1 + ADDRESS_HASH_SIZE + 4);
        payload.push(self.addr_type.version_byte());
        payload.extend_from_slice(&self.hash);
        let check = checksum(&payload);
        payload.extend_from_slice(&check);
        write!(f, "{}", bs58::encode(payload).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:?}, {})", self.addr_type, hex::encode(self.hash))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
