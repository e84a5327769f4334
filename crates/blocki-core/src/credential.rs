//! Credential types for Blocki KYC
//!
//! A credential bundles a verified proof artifact for one subject with an
//! absolute validity window. It travels as an opaque token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::ClaimName;
use crate::error::KycError;
use crate::issuer::{IssuerId, SubjectId};
use crate::proof::ProofArtifact;

/// Default validity window for issued credentials
pub const DEFAULT_VALIDITY_DAYS: i64 = 90;

/// Longest validity window an issuer may be configured with
pub const MAX_VALIDITY_DAYS: i64 = 3650;

/// Unique identifier for a credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub String);

impl CredentialId {
    pub fn generate() -> Self {
        Self(format!("cred_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time-bounded credential wrapping a verified proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    id: CredentialId,
    zk_proof: ProofArtifact,
    issuer: IssuerId,
    subject: SubjectId,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Assemble a credential valid for `validity` from `issued_at`
    ///
    /// Callers are responsible for having verified `proof`; the issuer crate
    /// enforces that ordering.
    pub fn new(
        proof: ProofArtifact,
        issuer: IssuerId,
        subject: SubjectId,
        issued_at: DateTime<Utc>,
        validity: Duration,
    ) -> Result<Self, KycError> {
        if validity <= Duration::zero() {
            return Err(KycError::Config(
                "credential validity window must be positive".into(),
            ));
        }

        let expires_at = issued_at.checked_add_signed(validity).ok_or_else(|| {
            KycError::Config("credential expiry is out of the representable range".into())
        })?;

        Ok(Self {
            id: CredentialId::generate(),
            zk_proof: proof,
            issuer,
            subject,
            issued_at,
            expires_at,
        })
    }

    pub fn id(&self) -> &CredentialId {
        &self.id
    }

    pub fn proof(&self) -> &ProofArtifact {
        &self.zk_proof
    }

    pub fn issuer(&self) -> &IssuerId {
        &self.issuer
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Attested value of a claim, if the proof carries it
    pub fn claim(&self, name: ClaimName) -> Option<bool> {
        self.zk_proof.public_signals.claim(name)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Reject the credential if it has expired at `now`
    pub fn ensure_valid_at(&self, now: DateTime<Utc>) -> Result<(), KycError> {
        if self.is_expired_at(now) {
            return Err(KycError::ExpiredCredential {
                expired_at: self.expires_at,
            });
        }
        Ok(())
    }

    /// Encode as an opaque token
    pub fn to_token(&self) -> Result<String, KycError> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decode a token produced by [`Credential::to_token`]
    pub fn from_token(token: &str) -> Result<Self, KycError> {
        let json = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| KycError::InvalidCredential(format!("token encoding: {}", e)))?;
        let credential: Credential = serde_json::from_slice(&json)
            .map_err(|e| KycError::InvalidCredential(format!("token body: {}", e)))?;

        if credential.expires_at <= credential.issued_at {
            return Err(KycError::InvalidCredential(
                "expiry does not follow issuance".into(),
            ));
        }

        Ok(credential)
    }
}
