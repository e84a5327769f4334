//! Dilithium attestation keys (NIST ML-DSA)
//!
//! The proving backend signs every proof statement with a Dilithium3 key.
//! The public half is the verification key published to verifiers.

use blocki_core::VerificationKeyId;
use pqcrypto_dilithium::dilithium3;
use pqcrypto_traits::sign::{DetachedSignature, PublicKey, SecretKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Error, Debug)]
pub enum DilithiumError {
    #[error("Invalid signature encoding")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid secret key")]
    InvalidSecretKey,

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Size of a Dilithium3 detached signature
pub fn signature_len() -> usize {
    dilithium3::signature_bytes()
}

/// Dilithium3 public key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumPublicKey {
    bytes: Vec<u8>,
}

impl DilithiumPublicKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DilithiumError> {
        dilithium3::PublicKey::from_bytes(bytes).map_err(|_| DilithiumError::InvalidPublicKey)?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Identifier under which this key is published
    pub fn key_id(&self) -> VerificationKeyId {
        VerificationKeyId::from_key_bytes(&self.bytes)
    }

    /// Verify a detached signature over `message`
    pub fn verify(
        &self,
        message: &[u8],
        signature: &DilithiumSignature,
    ) -> Result<(), DilithiumError> {
        let pk = dilithium3::PublicKey::from_bytes(&self.bytes)
            .map_err(|_| DilithiumError::InvalidPublicKey)?;
        let sig = dilithium3::DetachedSignature::from_bytes(&signature.bytes)
            .map_err(|_| DilithiumError::InvalidSignature)?;

        dilithium3::verify_detached_signature(&sig, message, &pk)
            .map_err(|_| DilithiumError::VerificationFailed)
    }
}

impl std::fmt::Debug for DilithiumPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DilithiumPublicKey({})", self.key_id())
    }
}

/// Dilithium3 secret key, wiped on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DilithiumSecretKey {
    bytes: Vec<u8>,
}

impl DilithiumSecretKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DilithiumError> {
        dilithium3::SecretKey::from_bytes(bytes).map_err(|_| DilithiumError::InvalidSecretKey)?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Raw key material; only the key store should need this
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature, DilithiumError> {
        let sk = dilithium3::SecretKey::from_bytes(&self.bytes)
            .map_err(|_| DilithiumError::InvalidSecretKey)?;
        let sig = dilithium3::detached_sign(message, &sk);
        Ok(DilithiumSignature {
            bytes: sig.as_bytes().to_vec(),
        })
    }
}

impl std::fmt::Debug for DilithiumSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DilithiumSecretKey([REDACTED])")
    }
}

/// Dilithium3 detached signature
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilithiumSignature {
    bytes: Vec<u8>,
}

impl DilithiumSignature {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Debug for DilithiumSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DilithiumSignature({} bytes)", self.bytes.len())
    }
}

/// Attestation key pair
pub struct DilithiumKeypair {
    pub public_key: DilithiumPublicKey,
    pub secret_key: DilithiumSecretKey,
}

impl DilithiumKeypair {
    pub fn generate() -> Self {
        let (pk, sk) = dilithium3::keypair();
        Self {
            public_key: DilithiumPublicKey {
                bytes: pk.as_bytes().to_vec(),
            },
            secret_key: DilithiumSecretKey {
                bytes: sk.as_bytes().to_vec(),
            },
        }
    }

    pub fn sign(&self, message: &[u8]) -> Result<DilithiumSignature, DilithiumError> {
        self.secret_key.sign(message)
    }

    pub fn verify(
        &self,
        message: &[u8],
        signature: &DilithiumSignature,
    ) -> Result<(), DilithiumError> {
        self.public_key.verify(message, signature)
    }

    pub fn key_id(&self) -> VerificationKeyId {
        self.public_key.key_id()
    }
}

impl std::fmt::Debug for DilithiumKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DilithiumKeypair")
            .field("public_key", &self.public_key)
            .field("secret_key", &self.secret_key)
            .finish()
    }
}
