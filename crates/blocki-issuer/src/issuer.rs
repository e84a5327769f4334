//! Credential issuance

use blocki_core::credential::{DEFAULT_VALIDITY_DAYS, MAX_VALIDITY_DAYS};
use blocki_core::{Credential, IssuerId, KycConfig, KycError, ProofArtifact, SubjectId};
use blocki_prover::{Verification, VerifiedProof, Verifier};
use chrono::{DateTime, Duration, Utc};

/// Credential issuer service
///
/// Issues only against a [`VerifiedProof`], so an artifact that has not
/// passed the verifier cannot be turned into a credential.
#[derive(Debug, Clone)]
pub struct Issuer {
    id: IssuerId,
    validity: Duration,
}

impl Issuer {
    pub fn new(id: IssuerId, validity: Duration) -> Result<Self, KycError> {
        if validity <= Duration::zero() {
            return Err(KycError::Config(
                "credential validity window must be positive".into(),
            ));
        }
        if validity > Duration::days(MAX_VALIDITY_DAYS) {
            return Err(KycError::Config(format!(
                "credential validity window exceeds {} days",
                MAX_VALIDITY_DAYS
            )));
        }
        Ok(Self { id, validity })
    }

    pub fn from_config(config: &KycConfig) -> Result<Self, KycError> {
        Self::new(config.issuer_id(), config.validity()?)
    }

    pub fn id(&self) -> &IssuerId {
        &self.id
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a credential for `subject` from a verified proof
    ///
    /// Each call yields an independent credential; issuing twice from the
    /// same proof is not deduplicated.
    pub fn issue(&self, proof: &VerifiedProof, subject: &SubjectId) -> Result<Credential, KycError> {
        self.issue_at(proof, subject, Utc::now())
    }

    pub fn issue_at(
        &self,
        proof: &VerifiedProof,
        subject: &SubjectId,
        now: DateTime<Utc>,
    ) -> Result<Credential, KycError> {
        if subject.as_str().trim().is_empty() {
            return Err(KycError::Validation(
                "subject identifier must not be empty".into(),
            ));
        }

        let credential = Credential::new(
            proof.artifact().clone(),
            self.id.clone(),
            subject.clone(),
            now,
            self.validity,
        )?;

        tracing::info!(
            credential_id = %credential.id(),
            proof_id = %proof.artifact().id,
            subject = %subject.short(),
            expires_at = %credential.expires_at(),
            "Issued credential"
        );

        Ok(credential)
    }

    /// Verify `artifact`, then issue
    ///
    /// A `false` verification outcome becomes
    /// [`KycError::VerificationFailed`].
    pub fn issue_artifact(
        &self,
        verifier: &Verifier,
        artifact: ProofArtifact,
        subject: &SubjectId,
    ) -> Result<Credential, KycError> {
        match verifier.verify(artifact) {
            Verification::Valid(proof) => self.issue(&proof, subject),
            Verification::Invalid { reason } => {
                tracing::warn!(%reason, "Refusing to issue for unverified proof");
                Err(KycError::VerificationFailed(reason))
            }
        }
    }
}

impl Default for Issuer {
    fn default() -> Self {
        Self {
            id: IssuerId::default(),
            validity: Duration::days(DEFAULT_VALIDITY_DAYS),
        }
    }
}
