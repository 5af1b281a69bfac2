//! Deterministic seed hierarchy.
//!
//! A master seed expands into sub-seeds per `(symbol, stream, index)` tuple
//! via BLAKE3. Derivation is hash-based, not sequential, so a ticker's forest
//! is identical whether it is analysed alone or alongside others on any
//! number of threads.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Named seed streams, kept apart so adding trees never shifts the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStream {
    Split,
    Tree,
    Synthetic,
}

impl SeedStream {
    fn tag(self) -> &'static [u8] {
        match self {
            SeedStream::Split => b"split",
            SeedStream::Tree => b"tree",
            SeedStream::Synthetic => b"synthetic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    master_seed: u64,
}

impl SeedHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn sub_seed(&self, symbol: &str, stream: SeedStream, index: u64) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        hasher.update(symbol.as_bytes());
        // separator keeps ("AB", "C...") and ("A", "BC...") apart
        hasher.update(&[0u8]);
        hasher.update(stream.tag());
        hasher.update(&index.to_le_bytes());
        let hash = hasher.finalize();
        let mut first = [0u8; 8];
        first.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(first)
    }

    pub fn rng_for(&self, symbol: &str, stream: SeedStream, index: u64) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(symbol, stream, index))
    }
}
