//! End-to-end KYC pipeline
//!
//! Evaluate -> Generate -> Verify -> (Publish | Issue). Each stage logs
//! identifiers only; the private inputs never reach a log line.

use blocki_core::{ClaimEvaluator, Credential, KycConfig, KycError, KycInput, SubjectId};
use blocki_crypto::DilithiumKeypair;
use blocki_ledger::{ledger_from_config, CommitmentPublisher, PublishReceipt};
use blocki_prover::{
    backend_from_config, CancelToken, Prover, Verification, VerificationKeyRegistry,
    VerifiedProof, Verifier,
};

use crate::issuer::Issuer;

/// The KYC stages wired together
#[derive(Debug, Clone)]
pub struct KycPipeline {
    evaluator: ClaimEvaluator,
    prover: Prover,
    verifier: Verifier,
    publisher: CommitmentPublisher,
    issuer: Issuer,
}

impl KycPipeline {
    pub fn new(
        evaluator: ClaimEvaluator,
        prover: Prover,
        verifier: Verifier,
        publisher: CommitmentPublisher,
        issuer: Issuer,
    ) -> Self {
        Self {
            evaluator,
            prover,
            verifier,
            publisher,
            issuer,
        }
    }

    /// Build every stage from configuration around an attestation key
    ///
    /// The key's public half is registered with the verifier.
    pub fn from_config(config: &KycConfig, keypair: DilithiumKeypair) -> Result<Self, KycError> {
        config.validate()?;

        let registry = VerificationKeyRegistry::with_key(keypair.public_key.clone());
        let backend = backend_from_config(&config.prover, keypair)?;
        let ledger = ledger_from_config(&config.ledger)?;

        Ok(Self::new(
            ClaimEvaluator::new(config.approved_regions()),
            Prover::new(backend),
            Verifier::new(registry),
            CommitmentPublisher::from_settings(ledger, &config.ledger),
            Issuer::from_config(config)?,
        ))
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    pub fn publisher(&self) -> &CommitmentPublisher {
        &self.publisher
    }

    /// Evaluate claims, generate a proof and check it
    ///
    /// A proof that fails its own check is a generation failure; the caller
    /// starts again from evaluation.
    pub async fn prove(
        &self,
        input: &KycInput,
        cancel: &CancelToken,
    ) -> Result<VerifiedProof, KycError> {
        let claims = self.evaluator.evaluate(input);
        tracing::debug!(stage = "evaluate", "Claims evaluated");

        let artifact = self.prover.generate(&claims, cancel).await?;
        let proof_id = artifact.id.clone();
        tracing::debug!(stage = "generate", proof_id = %proof_id, "Proof generated");

        match self.verifier.verify(artifact) {
            Verification::Valid(proof) => {
                tracing::info!(
                    stage = "verify",
                    proof_id = %proof_id,
                    commitment = %proof.commitment(),
                    "Proof passed self-check"
                );
                Ok(proof)
            }
            Verification::Invalid { reason } => {
                tracing::error!(
                    stage = "verify",
                    proof_id = %proof_id,
                    %reason,
                    "Proof failed self-check"
                );
                Err(KycError::ProofGeneration(format!(
                    "generated proof failed validation: {}",
                    reason
                )))
            }
        }
    }

    /// Publish the proof's commitment for `subject`
    pub async fn publish(
        &self,
        proof: &VerifiedProof,
        subject: &SubjectId,
    ) -> Result<PublishReceipt, KycError> {
        let receipt = self.publisher.publish(proof.artifact(), subject).await?;
        tracing::info!(
            stage = "publish",
            proof_id = %proof.artifact().id,
            transaction = %receipt.transaction,
            "Commitment published"
        );
        Ok(receipt)
    }

    /// Issue a credential for `subject`
    pub fn issue(&self, proof: &VerifiedProof, subject: &SubjectId) -> Result<Credential, KycError> {
        self.issuer.issue(proof, subject)
    }
}
