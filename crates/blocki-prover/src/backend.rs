//! Proving backend abstraction
//!
//! The prover only depends on [`ProofBackend`], so a succinct proof system can
//! replace the default backend without touching the callers.
//!
//! - Attested: binds the public signals to a salted witness commitment with a
//!   Dilithium3 signature from the prover's attestation key
//!
//! # Usage
//!
//! ```rust,ignore
//! use blocki_prover::backend::backend_from_config;
//!
//! let keypair = KeyStore::open(&config.prover.key_dir)?.load(&passphrase)?;
//! let backend = backend_from_config(&config.prover, keypair)?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use blocki_core::config::ProverSettings;
use blocki_core::{KycError, PublicSignals, VerificationKeyId};
use blocki_crypto::dilithium::{
    signature_len, DilithiumKeypair, DilithiumPublicKey, DilithiumSignature,
};
use blocki_crypto::hash::{random_bytes, tagged_hash};
use thiserror::Error;

use crate::witness::Witness;

/// Leading bytes of every attested payload
pub const PAYLOAD_HEADER: &[u8] = b"BLOCKI_PROOF_V1";

const COMMITMENT_LEN: usize = 32;
const NONCE_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend not available: {0}")]
    NotAvailable(String),

    #[error("Proof generation failed: {0}")]
    ProofFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<BackendError> for KycError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::ConfigError(msg) => KycError::Config(msg),
            other => KycError::ProofGeneration(other.to_string()),
        }
    }
}

/// Proof generation result
#[derive(Debug, Clone)]
pub struct ProofResult {
    /// Opaque proof bytes
    pub proof_bytes: Vec<u8>,

    /// Proving time in milliseconds
    pub proving_time_ms: u64,
}

/// Abstract proving backend
pub trait ProofBackend: Send + Sync {
    /// Generate a proof for a witness
    fn prove(&self, witness: &Witness) -> Result<ProofResult, BackendError>;

    /// Key under which this backend's proofs verify
    fn verification_key(&self) -> VerificationKeyId;

    fn name(&self) -> &str;

    fn is_available(&self) -> bool;
}

/// Decoded attested payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedPayload {
    pub witness_commitment: [u8; 32],
    pub nonce: [u8; 16],
    pub signature: DilithiumSignature,
}

impl AttestedPayload {
    pub fn encode(&self) -> Vec<u8> {
        let signature = self.signature.as_bytes();
        let mut out =
            Vec::with_capacity(PAYLOAD_HEADER.len() + COMMITMENT_LEN + NONCE_LEN + signature.len());
        out.extend_from_slice(PAYLOAD_HEADER);
        out.extend_from_slice(&self.witness_commitment);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(signature);
        out
    }

    /// Split a payload into its parts
    ///
    /// Errors describe why the bytes are not an attested payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let body = bytes
            .strip_prefix(PAYLOAD_HEADER)
            .ok_or_else(|| "invalid proof header".to_string())?;

        let expected = COMMITMENT_LEN + NONCE_LEN + signature_len();
        if body.len() != expected {
            return Err(format!(
                "payload body is {} bytes, expected {}",
                body.len(),
                expected
            ));
        }

        let (commitment, rest) = body.split_at(COMMITMENT_LEN);
        let (nonce, signature) = rest.split_at(NONCE_LEN);

        let mut witness_commitment = [0u8; COMMITMENT_LEN];
        witness_commitment.copy_from_slice(commitment);
        let mut nonce_bytes = [0u8; NONCE_LEN];
        nonce_bytes.copy_from_slice(nonce);

        Ok(Self {
            witness_commitment,
            nonce: nonce_bytes,
            signature: DilithiumSignature::from_bytes(signature),
        })
    }
}

/// Digest the attestation key signs
pub fn attestation_statement(
    circuit_id: &str,
    public_signals: &PublicSignals,
    witness_commitment: &[u8; 32],
    nonce: &[u8; 16],
) -> [u8; 32] {
    let mut parts: Vec<&[u8]> = Vec::with_capacity(public_signals.len() + 3);
    parts.push(circuit_id.as_bytes());
    parts.extend(public_signals.as_slice().iter().map(|s| s.as_bytes()));
    parts.push(witness_commitment);
    parts.push(nonce);
    tagged_hash("blocki:attestation:v1", &parts)
}

/// Check an attested payload against a verification key
///
/// Returns the reason on failure.
pub fn verify_attested(
    public_key: &DilithiumPublicKey,
    circuit_id: &str,
    proof_bytes: &[u8],
    public_signals: &PublicSignals,
) -> Result<(), String> {
    let payload = AttestedPayload::decode(proof_bytes)?;
    let statement = attestation_statement(
        circuit_id,
        public_signals,
        &payload.witness_commitment,
        &payload.nonce,
    );
    public_key
        .verify(&statement, &payload.signature)
        .map_err(|e| e.to_string())
}

/// Signature-attested backend
pub struct AttestedBackend {
    keypair: DilithiumKeypair,
}

impl AttestedBackend {
    pub fn new(keypair: DilithiumKeypair) -> Self {
        Self { keypair }
    }

    pub fn public_key(&self) -> &DilithiumPublicKey {
        &self.keypair.public_key
    }
}

impl ProofBackend for AttestedBackend {
    fn prove(&self, witness: &Witness) -> Result<ProofResult, BackendError> {
        let start = Instant::now();

        let witness_commitment = witness.commitment();
        let nonce: [u8; NONCE_LEN] = random_bytes();
        let statement = attestation_statement(
            witness.circuit_type.id(),
            witness.public_signals(),
            &witness_commitment,
            &nonce,
        );
        let signature = self
            .keypair
            .sign(&statement)
            .map_err(|e| BackendError::ProofFailed(e.to_string()))?;

        let proof_bytes = AttestedPayload {
            witness_commitment,
            nonce,
            signature,
        }
        .encode();

        Ok(ProofResult {
            proof_bytes,
            proving_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn verification_key(&self) -> VerificationKeyId {
        self.keypair.key_id()
    }

    fn name(&self) -> &str {
        "attested"
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Build the backend named in configuration
pub fn backend_from_config(
    settings: &ProverSettings,
    keypair: DilithiumKeypair,
) -> Result<Arc<dyn ProofBackend>, BackendError> {
    match settings.backend.as_str() {
        "attested" => Ok(Arc::new(AttestedBackend::new(keypair))),
        "stark" | "snark" => Err(BackendError::NotAvailable(format!(
            "{} backend is not compiled into this build",
            settings.backend
        ))),
        other => Err(BackendError::ConfigError(format!(
            "unknown prover backend: {}",
            other
        ))),
    }
}
