//! Fixed-domain haplotype coverage bit-vector.
//!
//! Word-packed over `u64`, the same shape as the bit arrays used for Bloom
//! filter payloads elsewhere in the pack (see `crate::prefilter`): storage
//! size tracks the domain size `N` exactly, binary ops require equal `N` and
//! fail loudly (`CoverageError::DomainMismatch`) rather than silently
//! truncating or zero-extending.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::err::CoverageError;

const WORD_BITS: usize = 64;

/// A fixed-domain subset of `[0, N)`, one bit per haplotype.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Coverage {
    words: Vec<u64>,
    size: usize,
}

impl Coverage {
    /// Construct an all-zero coverage over `size` haplotypes.
    pub fn empty(size: usize) -> Self {
        Self {
            words: vec![0u64; Self::word_count(size)],
            size,
        }
    }

    /// Construct an all-one coverage over `size` haplotypes.
    pub fn full(size: usize) -> Self {
        let mut cov = Self::empty(size);
        for i in 0..size {
            cov.set(i);
        }
        cov
    }

    /// Construct a coverage with exactly the given bits set.
    pub fn from_bits(size: usize, set_bits: impl IntoIterator<Item = usize>) -> Self {
        let mut cov = Self::empty(size);
        for i in set_bits {
            cov.set(i);
        }
        cov
    }

    fn word_count(size: usize) -> usize {
        size.div_ceil(WORD_BITS)
    }

    /// Number of haplotypes in the domain.
    pub fn size(&self) -> usize {
        self.size
    }

    fn check_domain(&self, other: &Coverage) -> Result<(), CoverageError> {
        if self.size != other.size {
            Err(CoverageError::DomainMismatch {
                lhs: self.size,
                rhs: other.size,
            })
        } else {
            Ok(())
        }
    }

    /// Set bit `i`. Panics if `i >= size()` (programming error, not a
    /// recoverable condition per this crate's "fail loudly" contract).
    pub fn set(&mut self, i: usize) {
        assert!(i < self.size, "coverage index {i} out of range {}", self.size);
        self.words[i / WORD_BITS] |= 1u64 << (i % WORD_BITS);
    }

    /// Clear bit `i`.
    pub fn clear(&mut self, i: usize) {
        assert!(i < self.size, "coverage index {i} out of range {}", self.size);
        self.words[i / WORD_BITS] &= !(1u64 << (i % WORD_BITS));
    }

    /// Whether haplotype `i` is covered.
    pub fn contains(&self, i: usize) -> bool {
        assert!(i < self.size, "coverage index {i} out of range {}", self.size);
        (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
    }

    /// Number of set bits.
    pub fn popcount(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether any bit is set.
    pub fn any(&self) -> bool {
        self.words.iter().any(|w| *w != 0)
    }

    /// Whether every bit in the domain is set.
    pub fn all(&self) -> bool {
        self.popcount() == self.size
    }

    /// Whether no bit is set.
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Iterate over the indices of set bits, in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size).filter(move |i| self.contains(*i))
    }

    fn elementwise(&self, other: &Coverage, f: impl Fn(u64, u64) -> u64) -> Result<Coverage, CoverageError> {
        self.check_domain(other)?;
        let words = self
            .words
            .iter()
            .zip(other.words.iter())
            .map(|(a, b)| f(*a, *b))
            .collect();
        Ok(Coverage {
            words,
            size: self.size,
        })
    }

    pub fn and(&self, other: &Coverage) -> Result<Coverage, CoverageError> {
        self.elementwise(other, |a, b| a & b)
    }

    pub fn or(&self, other: &Coverage) -> Result<Coverage, CoverageError> {
        self.elementwise(other, |a, b| a | b)
    }

    pub fn and_not(&self, other: &Coverage) -> Result<Coverage, CoverageError> {
        self.elementwise(other, |a, b| a & !b)
    }

    pub fn xor(&self, other: &Coverage) -> Result<Coverage, CoverageError> {
        self.elementwise(other, |a, b| a ^ b)
    }

    /// Bitwise complement, masked to the valid domain (trailing padding bits
    /// in the last word stay zero).
    pub fn not(&self) -> Coverage {
        let mut words: Vec<u64> = self.words.iter().map(|w| !w).collect();
        let rem = self.size % WORD_BITS;
        if rem != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
        Coverage {
            words,
            size: self.size,
        }
    }

    /// Size-prefixed little-endian word serialization: `u64` size, then
    /// `word_count()` `u64` words.
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_u64::<LittleEndian>(self.size as u64)?;
        for word in &self.words {
            w.write_u64::<LittleEndian>(*word)?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> std::io::Result<Coverage> {
        let size = r.read_u64::<LittleEndian>()? as usize;
        let mut words = vec![0u64; Self::word_count(size)];
        for word in &mut words {
            *word = r.read_u64::<LittleEndian>()?;
        }
        Ok(Coverage { words, size })
    }

    /// Pack into `ceil(N/8)` bytes, little-endian bit order within each byte
    /// (bit `j` of byte `i` is haplotype `8*i + j`), as used by the
    /// persisted RCMS format's per-variant coverage field.
    pub fn to_packed_bytes(&self) -> Vec<u8> {
        let nbytes = self.size.div_ceil(8);
        let mut out = vec![0u8; nbytes];
        for i in self.iter_set() {
            out[i / 8] |= 1 << (i % 8);
        }
        out
    }

    pub fn from_packed_bytes(size: usize, bytes: &[u8]) -> Coverage {
        let mut cov = Coverage::empty(size);
        for i in 0..size {
            if (bytes[i / 8] >> (i % 8)) & 1 == 1 {
                cov.set(i);
            }
        }
        cov
    }
}
