//! Marketplace access policy
//!
//! A valid proof only says the public signals are authentic; it says nothing
//! about whether they are favourable. Access decisions read the specific
//! claims off the credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::ClaimName;
use crate::credential::Credential;
use crate::error::KycError;

/// Outcome of an access check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    Granted,
    Denied {
        /// Required claims that were false or absent
        missing: Vec<ClaimName>,
    },
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }
}

/// Claims a credential must attest as true to grant access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    required: Vec<ClaimName>,
}

impl AccessPolicy {
    pub fn new(required: impl IntoIterator<Item = ClaimName>) -> Self {
        let mut required: Vec<ClaimName> = required.into_iter().collect();
        required.sort_by_key(ClaimName::index);
        required.dedup();
        Self { required }
    }

    /// Also require the prior-verification claim
    pub fn with_prior_verification(self) -> Self {
        Self::new(
            self.required
                .into_iter()
                .chain(std::iter::once(ClaimName::IsPriorVerified)),
        )
    }

    pub fn required(&self) -> &[ClaimName] {
        &self.required
    }

    /// Decide access for a credential at `now`
    ///
    /// Expired credentials are an error, never a denial.
    pub fn authorize(
        &self,
        credential: &Credential,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision, KycError> {
        credential.ensure_valid_at(now)?;

        let missing: Vec<ClaimName> = self
            .required
            .iter()
            .copied()
            .filter(|name| credential.claim(*name) != Some(true))
            .collect();

        if missing.is_empty() {
            Ok(AccessDecision::Granted)
        } else {
            Ok(AccessDecision::Denied { missing })
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new([ClaimName::IsOver18, ClaimName::IsApprovedRegion])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{IssuerId, SubjectId};
    use crate::proof::{ProofArtifact, ProofId, PublicSignals, VerificationKeyId};
    use chrono::Duration;

    fn credential(signals: [bool; 3], issued_at: DateTime<Utc>) -> Credential {
        let proof = ProofArtifact {
            id: ProofId::generate(),
            circuit_id: "kyc_eligibility_v1".to_string(),
            payload: vec![0u8; 8],
            public_signals: PublicSignals::from_values(signals),
            verification_key: VerificationKeyId::from_key_bytes(b"vk"),
            generated_at: issued_at,
        };
        Credential::new(
            proof,
            IssuerId::default(),
            SubjectId::new("GSUBJECT"),
            issued_at,
            Duration::days(90),
        )
        .unwrap()
    }

    #[test]
    fn test_grants_when_required_claims_hold() {
        let now = Utc::now();
        let decision = AccessPolicy::default()
            .authorize(&credential([true, true, false], now), now)
            .unwrap();
        assert!(decision.is_granted());
    }

    #[test]
    fn test_denies_minor() {
        let now = Utc::now();
        let decision = AccessPolicy::default()
            .authorize(&credential([false, true, true], now), now)
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Denied {
                missing: vec![ClaimName::IsOver18]
            }
        );
    }

    #[test]
    fn test_prior_verification_requirement() {
        let now = Utc::now();
        let policy = AccessPolicy::default().with_prior_verification();
        assert_eq!(policy.required().len(), 3);

        let decision = policy
            .authorize(&credential([true, true, false], now), now)
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Denied {
                missing: vec![ClaimName::IsPriorVerified]
            }
        );
    }

    #[test]
    fn test_expired_credential_is_error() {
        let now = Utc::now();
        let result =
            AccessPolicy::default().authorize(&credential([true, true, true], now - Duration::days(100)), now);
        assert!(matches!(result, Err(KycError::ExpiredCredential { .. })));
    }
}
