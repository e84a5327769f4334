//! On-disk storage for the prover's attestation key
//!
//! The secret key is sealed with a passphrase-derived key; the public key is
//! stored in the clear so verifiers can load it without the passphrase.
//!
//! Directory layout:
//! ```text
//! <key_dir>/
//!   attestation.pub    raw Dilithium3 public key bytes
//!   attestation.key    salt(16) || nonce(12) || AES-256-GCM ciphertext + tag
//! ```

use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use blocki_core::KycError;
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::dilithium::{DilithiumKeypair, DilithiumPublicKey, DilithiumSecretKey};
use crate::hash::random_bytes;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid key data: {0}")]
    InvalidKey(String),

    #[error("Key file could not be opened: wrong passphrase or corrupted file")]
    Unseal,

    #[error("No attestation key in {0}")]
    Missing(PathBuf),
}

pub type Result<T> = std::result::Result<T, KeyStoreError>;

impl From<KeyStoreError> for KycError {
    fn from(err: KeyStoreError) -> Self {
        KycError::Config(err.to_string())
    }
}

/// Filesystem-backed store for one attestation key pair
#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    /// Open a key store rooted at `dir`, creating the directory if absent
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn pub_path(&self) -> PathBuf {
        self.dir.join("attestation.pub")
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join("attestation.key")
    }

    pub fn has_keys(&self) -> bool {
        self.pub_path().exists() && self.key_path().exists()
    }

    /// Load the key pair, generating and persisting a fresh one if absent
    pub fn load_or_generate(&self, passphrase: &str) -> Result<DilithiumKeypair> {
        if self.has_keys() {
            return self.load(passphrase);
        }

        let keypair = DilithiumKeypair::generate();
        self.save(&keypair, passphrase)?;
        tracing::info!(
            key_id = %keypair.key_id(),
            dir = %self.dir.display(),
            "Generated new attestation key"
        );
        Ok(keypair)
    }

    /// Persist a key pair; the secret half is sealed under `passphrase`
    pub fn save(&self, keypair: &DilithiumKeypair, passphrase: &str) -> Result<()> {
        std::fs::write(self.pub_path(), keypair.public_key.as_bytes())?;

        let sealed = seal(keypair.secret_key.as_bytes(), passphrase)?;
        std::fs::write(self.key_path(), sealed)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(self.key_path(), std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    pub fn load(&self, passphrase: &str) -> Result<DilithiumKeypair> {
        if !self.has_keys() {
            return Err(KeyStoreError::Missing(self.dir.clone()));
        }

        let public_key = self.load_public_key()?;
        let sealed = std::fs::read(self.key_path())?;

        let secret = unseal(&sealed, passphrase)?;
        let secret_key = DilithiumSecretKey::from_bytes(&secret)
            .map_err(|e| KeyStoreError::InvalidKey(format!("secret key: {}", e)))?;

        Ok(DilithiumKeypair {
            public_key,
            secret_key,
        })
    }

    /// Load only the verification key; no passphrase needed
    pub fn load_public_key(&self) -> Result<DilithiumPublicKey> {
        let path = self.pub_path();
        if !path.exists() {
            return Err(KeyStoreError::Missing(self.dir.clone()));
        }
        let bytes = std::fs::read(path)?;
        DilithiumPublicKey::from_bytes(&bytes)
            .map_err(|e| KeyStoreError::InvalidKey(format!("public key: {}", e)))
    }
}

/// Derive the sealing key for one key file
fn derive_sealing_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), passphrase.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(b"blocki-keystore-sealing-key", &mut *okm)
        .map_err(|e| KeyStoreError::InvalidKey(format!("HKDF expand failed: {}", e)))?;
    Ok(okm)
}

/// Seal `plaintext` as `salt || nonce || ciphertext` (ciphertext carries the GCM tag)
fn seal(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let salt: [u8; SALT_LEN] = random_bytes();
    let nonce: [u8; NONCE_LEN] = random_bytes();
    let key = derive_sealing_key(passphrase, &salt)?;

    let cipher = Aes256Gcm::new_from_slice(&*key)
        .map_err(|e| KeyStoreError::InvalidKey(format!("cipher init failed: {}", e)))?;
    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce), plaintext)
        .map_err(|e| KeyStoreError::InvalidKey(format!("encryption failed: {}", e)))?;

    let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn unseal(data: &[u8], passphrase: &str) -> Result<Zeroizing<Vec<u8>>> {
    if data.len() < SALT_LEN + NONCE_LEN + TAG_LEN {
        return Err(KeyStoreError::InvalidKey("sealed key too short".into()));
    }

    let (salt, rest) = data.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);
    let key = derive_sealing_key(passphrase, salt)?;

    let cipher = Aes256Gcm::new_from_slice(&*key)
        .map_err(|e| KeyStoreError::InvalidKey(format!("cipher init failed: {}", e)))?;
    cipher
        .decrypt(AesNonce::from_slice(nonce), ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| KeyStoreError::Unseal)
}
