//! Standalone proof verification
//!
//! The verifier needs only the artifact and the published verification
//! keys. It never sees private inputs and does not care who produced the
//! proof. Every way an artifact can fail to check out is reported as an
//! `Invalid` outcome rather than an error.

use std::collections::HashMap;

use blocki_core::{ClaimName, Commitment, ProofArtifact, VerificationKeyId};
use blocki_crypto::keystore::{KeyStore, KeyStoreError};
use blocki_crypto::DilithiumPublicKey;
use chrono::{DateTime, Utc};

use crate::backend::verify_attested;
use crate::circuit::CircuitType;

/// Published verification keys, by id
#[derive(Debug, Clone, Default)]
pub struct VerificationKeyRegistry {
    keys: HashMap<VerificationKeyId, DilithiumPublicKey>,
}

impl VerificationKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry containing a single key
    pub fn with_key(public_key: DilithiumPublicKey) -> Self {
        let mut registry = Self::new();
        registry.insert(public_key);
        registry
    }

    /// Registry holding the public key from a key store directory
    pub fn from_key_store(store: &KeyStore) -> Result<Self, KeyStoreError> {
        Ok(Self::with_key(store.load_public_key()?))
    }

    /// Add a key; returns its id
    pub fn insert(&mut self, public_key: DilithiumPublicKey) -> VerificationKeyId {
        let id = public_key.key_id();
        self.keys.insert(id.clone(), public_key);
        id
    }

    pub fn get(&self, id: &VerificationKeyId) -> Option<&DilithiumPublicKey> {
        self.keys.get(id)
    }

    pub fn contains(&self, id: &VerificationKeyId) -> bool {
        self.keys.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A proof artifact that passed verification
///
/// Only [`Verifier`] constructs this, so holding one is evidence that the
/// artifact checked out.
#[derive(Debug, Clone)]
pub struct VerifiedProof {
    artifact: ProofArtifact,
    verified_at: DateTime<Utc>,
}

impl VerifiedProof {
    pub fn artifact(&self) -> &ProofArtifact {
        &self.artifact
    }

    pub fn into_artifact(self) -> ProofArtifact {
        self.artifact
    }

    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }

    pub fn commitment(&self) -> Commitment {
        self.artifact.commitment()
    }
}

/// Outcome of verifying an artifact
#[derive(Debug, Clone)]
pub enum Verification {
    Valid(VerifiedProof),
    Invalid { reason: String },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid(_))
    }

    pub fn verified(self) -> Option<VerifiedProof> {
        match self {
            Verification::Valid(proof) => Some(proof),
            Verification::Invalid { .. } => None,
        }
    }
}

/// Proof verifier
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    registry: VerificationKeyRegistry,
}

impl Verifier {
    pub fn new(registry: VerificationKeyRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &VerificationKeyRegistry {
        &self.registry
    }

    /// Verify an artifact, taking ownership on success
    pub fn verify(&self, artifact: ProofArtifact) -> Verification {
        match self.check(&artifact) {
            Ok(()) => {
                tracing::debug!(proof_id = %artifact.id, "Proof verified");
                Verification::Valid(VerifiedProof {
                    artifact,
                    verified_at: Utc::now(),
                })
            }
            Err(reason) => {
                tracing::debug!(proof_id = %artifact.id, %reason, "Proof rejected");
                Verification::Invalid { reason }
            }
        }
    }

    pub fn is_valid(&self, artifact: &ProofArtifact) -> bool {
        self.check(artifact).is_ok()
    }

    fn check(&self, artifact: &ProofArtifact) -> Result<(), String> {
        let circuit = CircuitType::from_id(&artifact.circuit_id)
            .ok_or_else(|| format!("unknown circuit: {}", artifact.circuit_id))?;

        if artifact.public_signals.len() != circuit.public_input_count() {
            return Err(format!(
                "expected {} public signals, got {}",
                circuit.public_input_count(),
                artifact.public_signals.len()
            ));
        }
        if let Some(name) = ClaimName::ALL
            .iter()
            .find(|name| artifact.public_signals.claim(**name).is_none())
        {
            return Err(format!("public signal {} is not a boolean", name));
        }

        let public_key = self
            .registry
            .get(&artifact.verification_key)
            .ok_or_else(|| format!("unknown verification key: {}", artifact.verification_key))?;

        verify_attested(
            public_key,
            circuit.id(),
            &artifact.payload,
            &artifact.public_signals,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AttestedBackend;
    use crate::cancel::CancelToken;
    use crate::prover::Prover;
    use blocki_core::{Claims, PublicSignals};
    use blocki_crypto::DilithiumKeypair;
    use std::sync::Arc;

    async fn setup() -> (Verifier, ProofArtifact) {
        let keypair = DilithiumKeypair::generate();
        let verifier = Verifier::new(VerificationKeyRegistry::with_key(keypair.public_key.clone()));
        let prover = Prover::new(Arc::new(AttestedBackend::new(keypair)));

        let claims = Claims {
            is_over_18: true,
            is_approved_region: true,
            is_prior_verified: true,
            evaluated_at: Utc::now(),
        };
        let artifact = prover.generate(&claims, &CancelToken::new()).await.unwrap();
        (verifier, artifact)
    }

    #[tokio::test]
    async fn test_verify_fresh_proof() {
        let (verifier, artifact) = setup().await;
        assert!(verifier.is_valid(&artifact));

        let verified = verifier.verify(artifact.clone()).verified().unwrap();
        assert_eq!(verified.artifact(), &artifact);
        assert_eq!(verified.commitment(), artifact.commitment());
    }

    #[tokio::test]
    async fn test_every_payload_byte_is_covered() {
        let (verifier, artifact) = setup().await;

        // Header, witness commitment, nonce, and a spread of signature bytes
        let len = artifact.payload.len();
        let positions = [0, 14, 15, 46, 47, 62, 63, len / 2, len - 1];
        for pos in positions {
            let mut tampered = artifact.clone();
            tampered.payload[pos] ^= 0x01;
            assert!(!verifier.is_valid(&tampered), "byte {} not covered", pos);
        }
    }

    #[tokio::test]
    async fn test_flipped_signal_rejected() {
        let (verifier, artifact) = setup().await;

        for index in 0..3 {
            let mut values = [true, true, true];
            values[index] = false;
            let mut tampered = artifact.clone();
            tampered.public_signals = PublicSignals::from_values(values);
            assert!(!verifier.is_valid(&tampered));
        }
    }

    #[tokio::test]
    async fn test_malformed_artifacts_are_invalid_not_errors() {
        let (verifier, artifact) = setup().await;

        let mut wrong_circuit = artifact.clone();
        wrong_circuit.circuit_id = "age_verification_v1".to_string();
        assert!(!verifier.verify(wrong_circuit).is_valid());

        let mut short = artifact.clone();
        short.public_signals = PublicSignals::from_values([true, true]);
        assert!(!verifier.verify(short).is_valid());

        let mut garbled = artifact.clone();
        garbled.public_signals =
            PublicSignals::new(vec!["true".into(), "yes".into(), "true".into()]);
        assert!(!verifier.verify(garbled).is_valid());

        let mut truncated = artifact.clone();
        truncated.payload.truncate(40);
        match verifier.verify(truncated) {
            Verification::Invalid { reason } => assert!(reason.contains("payload")),
            Verification::Valid(_) => panic!("truncated payload accepted"),
        }
    }

    #[tokio::test]
    async fn test_unknown_key() {
        let (_, artifact) = setup().await;
        let stranger = Verifier::new(VerificationKeyRegistry::with_key(
            DilithiumKeypair::generate().public_key,
        ));

        match stranger.verify(artifact) {
            Verification::Invalid { reason } => assert!(reason.contains("unknown verification key")),
            Verification::Valid(_) => panic!("proof accepted under unknown key"),
        }
    }

    #[test]
    fn test_registry_from_key_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::open(dir.path()).unwrap();
        let keypair = store.load_or_generate("pass").unwrap();

        let registry = VerificationKeyRegistry::from_key_store(&store).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(&keypair.key_id()));
    }
}
