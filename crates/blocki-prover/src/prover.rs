//! Proof generation

use std::sync::Arc;

use blocki_core::{Claims, KycError, ProofArtifact, ProofId, VerificationKeyId};
use chrono::Utc;
use thiserror::Error;

use crate::backend::{BackendError, ProofBackend};
use crate::cancel::CancelToken;
use crate::witness::KycWitnessBuilder;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("Invalid witness: {0}")]
    InvalidWitness(String),

    #[error("Proof generation failed: {0}")]
    ProofGenerationFailed(String),

    #[error("Proof generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<ProverError> for KycError {
    fn from(err: ProverError) -> Self {
        KycError::ProofGeneration(err.to_string())
    }
}

/// Generates proof artifacts from evaluated claims
///
/// Proving is CPU-bound and runs on the blocking pool. A run that is
/// cancelled has no effect; generating again starts from scratch.
#[derive(Clone)]
pub struct Prover {
    backend: Arc<dyn ProofBackend>,
}

impl Prover {
    pub fn new(backend: Arc<dyn ProofBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn verification_key(&self) -> VerificationKeyId {
        self.backend.verification_key()
    }

    /// Generate a proof for a set of claims
    pub async fn generate(
        &self,
        claims: &Claims,
        cancel: &CancelToken,
    ) -> Result<ProofArtifact, ProverError> {
        if cancel.is_cancelled() {
            return Err(ProverError::Cancelled);
        }
        if !self.backend.is_available() {
            return Err(BackendError::NotAvailable(self.backend.name().to_string()).into());
        }

        let witness = KycWitnessBuilder::new().claims(claims).build()?;
        let circuit = witness.circuit_type;
        let public_signals = witness.public_signals().clone();

        let backend = Arc::clone(&self.backend);
        let task = tokio::task::spawn_blocking(move || backend.prove(&witness));

        let result = tokio::select! {
            joined = task => joined
                .map_err(|e| ProverError::ProofGenerationFailed(format!("prover task failed: {}", e)))??,
            _ = cancel.cancelled() => {
                tracing::warn!(backend = self.backend.name(), "Proof generation cancelled");
                return Err(ProverError::Cancelled);
            }
        };

        let artifact = ProofArtifact {
            id: ProofId::generate(),
            circuit_id: circuit.id().to_string(),
            payload: result.proof_bytes,
            public_signals,
            verification_key: self.backend.verification_key(),
            generated_at: Utc::now(),
        };

        tracing::info!(
            proof_id = %artifact.id,
            backend = self.backend.name(),
            size_bytes = artifact.size_bytes(),
            proving_time_ms = result.proving_time_ms,
            "Generated proof"
        );

        Ok(artifact)
    }
}

impl std::fmt::Debug for Prover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prover")
            .field("backend", &self.backend.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AttestedBackend, ProofResult};
    use crate::witness::Witness;
    use blocki_crypto::DilithiumKeypair;
    use std::time::Duration;

    fn claims() -> Claims {
        Claims {
            is_over_18: false,
            is_approved_region: true,
            is_prior_verified: true,
            evaluated_at: Utc::now(),
        }
    }

    /// Backend that takes a long time, for cancellation tests
    struct SlowBackend;

    impl ProofBackend for SlowBackend {
        fn prove(&self, _witness: &Witness) -> Result<ProofResult, BackendError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(ProofResult {
                proof_bytes: vec![0u8; 8],
                proving_time_ms: 500,
            })
        }

        fn verification_key(&self) -> VerificationKeyId {
            VerificationKeyId::new("vk_slow")
        }

        fn name(&self) -> &str {
            "slow"
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_generate() {
        let prover = Prover::new(Arc::new(AttestedBackend::new(DilithiumKeypair::generate())));
        let artifact = prover.generate(&claims(), &CancelToken::new()).await.unwrap();

        assert_eq!(artifact.circuit_id, "kyc_eligibility_v1");
        assert_eq!(
            artifact.public_signals.as_slice(),
            &["false", "true", "true"]
        );
        assert_eq!(artifact.verification_key, prover.verification_key());
        assert!(artifact.id.0.starts_with("prf_"));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let prover = Prover::new(Arc::new(SlowBackend));
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = prover.generate(&claims(), &cancel).await;
        assert!(matches!(result, Err(ProverError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancel_during_proving() {
        let prover = Prover::new(Arc::new(SlowBackend));
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = prover.generate(&claims(), &cancel).await;
        assert!(matches!(result, Err(ProverError::Cancelled)));
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[test]
    fn test_error_maps_to_proof_generation() {
        let err: KycError = ProverError::Cancelled.into();
        assert!(matches!(err, KycError::ProofGeneration(_)));
        assert!(err.is_retriable());
    }
}
