use std::io::Cursor;

use serde::{Deserialize, Serialize};

/// Murmur3 seed multiplier, one distinct seed per hash function.
const SEED_MULTIPLIER: u32 = 0xFBA4_C795;

const MIN_FILTER_BYTES: usize = 8;
const MAX_HASH_FUNCS: u32 = 50;

/// Probabilistic membership filter over address hashes.
///
/// False positives are possible and are rejected later against the
/// authoritative address records; false negatives never occur for
/// inserted elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloomFilter {
    bits: Vec<u8>,
    n_hash_funcs: u32,
    tweak: u32,
    n_inserted: u64,
}

impl BloomFilter {
    /// Sizes the filter for an expected element count and target
    /// false-positive rate.
    pub fn with_rate(expected_elements: u32, false_positive_rate: f64, tweak: u32) -> Self {
        let n = expected_elements.max(1) as f64;
        let p = false_positive_rate.clamp(1e-9, 0.5);
        let ln2 = std::f64::consts::LN_2;
        let m_bits = (-n * p.ln() / (ln2 * ln2)).ceil();
        let n_bytes = ((m_bits / 8.0).ceil() as usize).max(MIN_FILTER_BYTES);
        let k = ((n_bytes * 8) as f64 / n * ln2).round() as u32;
        Self {
            bits: vec![0u8; n_bytes],
            n_hash_funcs: k.clamp(1, MAX_HASH_FUNCS),
            tweak,
            n_inserted: 0,
        }
    }

    pub fn insert(&mut self, element: &[u8]) {
        for i in 0..self.n_hash_funcs {
            let pos = self.bit_position(i, element);
            self.bits[pos / 8] |= 1 << (pos % 8);
        }
        self.n_inserted += 1;
    }

    /// True if the element may be in the set; false means definitely not.
    pub fn contains(&self, element: &[u8]) -> bool {
        (0..self.n_hash_funcs).all(|i| {
            let pos = self.bit_position(i, element);
            self.bits[pos / 8] & (1 << (pos % 8)) != 0
        })
    }

    pub fn is_empty(&self) -> bool {
        self.n_inserted == 0
    }

    pub fn inserted(&self) -> u64 {
        self.n_inserted
    }

    fn bit_position(&self, i: u32, element: &[u8]) -> usize {
        let seed = i.wrapping_mul(SEED_MULTIPLIER).wrapping_add(self.tweak);
        // Reading from an in-memory cursor cannot fail.
        let hash = murmur3::murmur3_32(&mut Cursor::new(element), seed).unwrap_or(0);
        (hash as usize) % (self.bits.len() * 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_elements_are_contained() {
        let mut filter = BloomFilter::with_rate(100, 0.01, 0);
        for i in 0u32..100 {
            filter.insert(&i.to_be_bytes());
        }
        for i in 0u32..100 {
            assert!(filter.contains(&i.to_be_bytes()), "false negative for {}", i);
        }
    }

    #[test]
    fn empty_filter_contains_nothing() {
        let filter = BloomFilter::with_rate(100, 0.01, 0);
        assert!(filter.is_empty());
        assert!(!filter.contains(b"anything"));
    }

    #[test]
    fn tweak_changes_bit_layout() {
        let mut a = BloomFilter::with_rate(10, 0.01, 0);
        let mut b = BloomFilter::with_rate(10, 0.01, 12345);
        a.insert(b"element");
        b.insert(b"element");
        assert_ne!(a.bits, b.bits);
    }
}
