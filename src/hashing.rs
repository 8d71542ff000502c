//! Deterministic hashing used to derive random seeds and to key small lookup tables.
//!
//! The hashing data structures in the standard library are not deterministic: the default
//! hasher is randomly seeded per process. Random stream seeds must be identical across runs and
//! platforms, so we hash with xxh3, and use `rustc_hash` for maps that are never iterated in an
//! order that matters.

use xxhash_rust::xxh3::xxh3_64_with_seed;

pub use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

/// Odd multiplier used to spread consecutive integers across the seed space.
const SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Hashes `data` under a seed derived from `base_seed` and `salt`. Distinct salts give
/// unrelated results even for adjacent values.
#[must_use]
pub fn hash_str_salted(data: &str, base_seed: u64, salt: u64) -> u64 {
    xxh3_64_with_seed(data.as_bytes(), base_seed ^ salt.wrapping_mul(SPREAD))
}
