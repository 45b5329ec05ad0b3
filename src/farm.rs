//! Faster (but not DoS-resistant) hashmap for lexicon lookups
//!
//! Every token of every tweet is looked up at least once, and the keys come from a file we
//! trust, so there's no need for SipHash here.
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};

/// Farmhash as a `Hasher`
///
/// Farmhash isn't a streaming hash, so each `write` is folded into the running value as a seed.
/// `str` keys hash as their bytes plus a terminator byte, which this keeps distinct.
pub struct FarmHasher(u64);

impl Default for FarmHasher {
    #[inline]
    fn default() -> FarmHasher { FarmHasher(0) }
}

impl Hasher for FarmHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.0 = farmhash::hash64_with_seed(bytes, self.0);
    }
}

pub type Farm = BuildHasherDefault<FarmHasher>;
pub type FarmMap<X, Y> = HashMap<X, Y, Farm>;

pub fn new_farm<X: Hash + Eq, Y>() -> FarmMap<X, Y> {
    Default::default()
}
