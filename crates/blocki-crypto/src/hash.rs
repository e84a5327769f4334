//! Hash functions for Blocki
//!
//! SHA3-256 everywhere. Domain tags keep digests from different contexts
//! apart even when their inputs coincide.

use rand::RngCore;
use sha3::{Digest, Sha3_256};

/// SHA3-256 over a domain tag and length-prefixed parts
pub fn tagged_hash(tag: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update((tag.len() as u32).to_be_bytes());
    hasher.update(tag.as_bytes());
    for part in parts {
        hasher.update((part.len() as u32).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Fresh random bytes from the thread RNG
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut out = [0u8; N];
    rand::thread_rng().fill_bytes(&mut out);
    out
}
