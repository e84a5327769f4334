//! Blocki Crypto
//!
//! Cryptographic primitives for the KYC workflow:
//! - SHA3-256 hashing with domain tags
//! - Dilithium3 attestation signatures
//! - Passphrase-sealed key storage

pub mod dilithium;
pub mod hash;
pub mod keystore;

pub use dilithium::{
    DilithiumError, DilithiumKeypair, DilithiumPublicKey, DilithiumSecretKey, DilithiumSignature,
};
pub use hash::{random_bytes, tagged_hash};
pub use keystore::{KeyStore, KeyStoreError};
