//! Consumer-side credential checks

use blocki_core::{AccessDecision, AccessPolicy, Credential, KycError};
use blocki_prover::Verifier;
use chrono::{DateTime, Utc};

/// Validates credentials presented to a relying party
#[derive(Debug, Clone, Default)]
pub struct CredentialValidator {
    policy: AccessPolicy,
    verifier: Option<Verifier>,
}

impl CredentialValidator {
    pub fn new(policy: AccessPolicy) -> Self {
        Self {
            policy,
            verifier: None,
        }
    }

    /// Also re-verify the embedded proof on every check
    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Reject an expired credential, and one whose proof no longer verifies
    pub fn validate(&self, credential: &Credential, now: DateTime<Utc>) -> Result<(), KycError> {
        credential.ensure_valid_at(now)?;

        if let Some(verifier) = &self.verifier {
            if !verifier.is_valid(credential.proof()) {
                return Err(KycError::InvalidCredential(format!(
                    "embedded proof {} does not verify",
                    credential.proof().id
                )));
            }
        }

        Ok(())
    }

    /// Decode a credential token and validate it
    pub fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<Credential, KycError> {
        let credential = Credential::from_token(token)?;
        self.validate(&credential, now)?;
        Ok(credential)
    }

    /// Validate, then apply the access policy
    pub fn authorize(
        &self,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, KycError> {
        self.validate(credential, now)?;
        let decision = self.policy.authorize(credential, now)?;

        if let AccessDecision::Denied { missing } = &decision {
            tracing::info!(
                credential_id = %credential.id(),
                missing = ?missing,
                "Access denied"
            );
        }

        Ok(decision)
    }
}
