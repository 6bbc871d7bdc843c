//! Slot indexing.
//!
//! An identifier is digested with MD5 and the digest reduced to a `u32`,
//! which is then masked into the table. MD5 is used only for its
//! distribution; nothing here relies on it being cryptographic.

use crate::config::{IndexStrategy, MAX_FILTER_SIZE_LIMIT};
use crate::error::{Error, Result};
use md5::{Digest, Md5};

/// Largest value the legacy reduction can produce: `(0xff << 6) + (0xff << 3) + 0xff`.
pub const LEGACY_HASH_MAX: u32 = (0xff << 6) + (0xff << 3) + 0xff;

/// Maps identifiers to slot indices for a table of fixed power-of-two size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indexer {
    size_mask: u32,
    strategy: IndexStrategy,
}

impl Indexer {
    /// Create an indexer for a table of `capacity` slots.
    ///
    /// # Errors
    /// `InvalidArgument` unless `capacity` is a power of two no larger than
    /// `MAX_FILTER_SIZE_LIMIT`.
    pub fn new(capacity: usize, strategy: IndexStrategy) -> Result<Self> {
        if !capacity.is_power_of_two() || capacity > MAX_FILTER_SIZE_LIMIT {
            return Err(Error::invalid_argument(format!(
                "indexer capacity must be a power of two up to {}, got {}",
                MAX_FILTER_SIZE_LIMIT, capacity
            )));
        }

        Ok(Self {
            size_mask: (capacity - 1) as u32,
            strategy,
        })
    }

    /// The mask applied to reduced hashes (`capacity - 1`).
    pub fn size_mask(&self) -> u32 {
        self.size_mask
    }

    /// The reduction strategy in use.
    pub fn strategy(&self) -> IndexStrategy {
        self.strategy
    }

    /// Compute the unmasked 32-bit hash of `id`.
    pub fn hash(&self, id: &[u8]) -> u32 {
        let digest = digest(id);
        match self.strategy {
            IndexStrategy::Legacy => legacy_reduce(&digest),
            IndexStrategy::Folded => folded_reduce(&digest),
        }
    }

    /// Compute the slot index of `id`, always in `[0, capacity)`.
    #[inline]
    pub fn index(&self, id: &[u8]) -> usize {
        (self.hash(id) & self.size_mask) as usize
    }
}

/// MD5 digest of `id`.
pub fn digest(id: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out.copy_from_slice(&Md5::digest(id));
    out
}

fn legacy_reduce(digest: &[u8; 16]) -> u32 {
    digest[1..3]
        .iter()
        .fold(digest[0] as u32, |acc, &b| (acc << 3).wrapping_add(b as u32))
}

fn folded_reduce(digest: &[u8; 16]) -> u32 {
    digest
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .fold(0, |acc, w| acc ^ w)
}
