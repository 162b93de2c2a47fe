//! Bloom filter with Kirsch-Mitzenmacher double hashing.
//!
//! A single 64-bit FNV-1a hash is split into two 32-bit halves `a` and `b`;
//! the `k` probe positions are `(a + i * b) mod m` for `i` in `0..k`
//! (<https://www.eecs.harvard.edu/~michaelm/postscripts/tr-02-05.pdf>).

use std::f64::consts::LN_2;
use std::hash::Hasher;

use bitvec::prelude::*;
use fnv::FnvHasher;
use rayon::prelude::*;

use crate::error::{PsiError, Result};

/// Split a fresh 64-bit FNV-1a hash of `item` into its high and low halves.
pub fn hash_pair(item: &[u8]) -> (u64, u64) {
    let mut hasher = FnvHasher::default();
    hasher.write(item);
    let hashed = hasher.finish();
    (hashed >> 32, hashed & 0xffff_ffff)
}

/// Position of the `i`-th probe in a filter of `m` bits.
#[inline]
pub fn index(i: u64, a: u64, b: u64, m: u64) -> u64 {
    a.wrapping_add(i.wrapping_mul(b)) % m
}

#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: BitVec,
    /// number of bits (m)
    m: u64,
    /// number of probes per item (k)
    k: u64,
    expected_items: usize,
    false_positive_rate: f64,
    inserted: usize,
}

impl BloomFilter {
    /// Size a filter for `expected_items` entries at `false_positive_rate`.
    ///
    /// `m = ceil(-n ln(p) / ln(2)^2)` and `k = ceil(ln(2) m / n)`, both at
    /// least one.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> Result<Self> {
        if expected_items == 0 {
            return Err(PsiError::InvalidFilter(
                "expected items must be at least 1".to_string(),
            ));
        }
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(PsiError::InvalidFilter(format!(
                "false positive rate {false_positive_rate} is outside (0, 1)"
            )));
        }

        let n = expected_items as f64;
        let m = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil().max(1.0) as u64;
        let k = (LN_2 * m as f64 / n).ceil().max(1.0) as u64;
        let len = usize::try_from(m).map_err(|_| {
            PsiError::InvalidFilter(format!("{m} bits do not fit in memory"))
        })?;

        Ok(Self {
            bits: bitvec![0; len],
            m,
            k,
            expected_items,
            false_positive_rate,
            inserted: 0,
        })
    }

    fn probes(&self, item: &[u8]) -> impl Iterator<Item = usize> + '_ {
        let (a, b) = hash_pair(item);
        (0..self.k).map(move |i| index(i, a, b, self.m) as usize)
    }

    pub fn add(&mut self, item: &[u8]) {
        let (a, b) = hash_pair(item);
        for i in 0..self.k {
            let idx = index(i, a, b, self.m) as usize;
            self.bits.set(idx, true);
        }
        self.inserted += 1;
    }

    pub fn add_all<I, T>(&mut self, items: I)
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        for item in items {
            self.add(item.as_ref());
        }
    }

    /// `true` if `item` is probably in the set, `false` if it definitely is not.
    pub fn test(&self, item: &[u8]) -> bool {
        self.probes(item).all(|idx| self.bits[idx])
    }

    /// Test every item, preserving input order.
    pub fn test_multiple<T>(&self, items: &[T]) -> Vec<bool>
    where
        T: AsRef<[u8]> + Sync,
    {
        items.par_iter().map(|item| self.test(item.as_ref())).collect()
    }

    /// Size of the bit array (m).
    pub fn bits(&self) -> u64 {
        self.m
    }

    /// Number of probes per item (k).
    pub fn hashes(&self) -> u64 {
        self.k
    }

    pub fn expected_items(&self) -> usize {
        self.expected_items
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    /// Number of items added so far.
    pub fn len(&self) -> usize {
        self.inserted
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }
}
