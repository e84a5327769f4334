//! Error types for Blocki KYC

use thiserror::Error;

/// Main error type for the KYC workflow
///
/// Each variant maps to one failure class a caller has to handle
/// differently, see [`FailureKind`].
#[derive(Error, Debug)]
pub enum KycError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("Proof verification failed: {0}")]
    VerificationFailed(String),

    #[error("Commitment publish failed: {0}")]
    Publish(String),

    #[error("Credential expired at {expired_at}")]
    ExpiredCredential {
        expired_at: chrono::DateTime<chrono::Utc>,
    },

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// How a failure should be presented to the subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The private input was malformed; the subject should fix it
    CheckInput,
    /// Transient failure; the same step can be attempted again
    TryAgain,
    /// Terminal for this attempt; restart from claim evaluation
    Restart,
    /// The credential is no longer usable; obtain a new one
    Expired,
    /// Not actionable by the subject
    Internal,
}

impl FailureKind {
    /// Short guidance line for user-facing callers
    pub fn guidance(&self) -> &'static str {
        match self {
            FailureKind::CheckInput => "check your input and submit again",
            FailureKind::TryAgain => "try again",
            FailureKind::Restart => "start the verification again from the beginning",
            FailureKind::Expired => "your credential has expired, verify again to renew it",
            FailureKind::Internal => "contact support",
        }
    }
}

impl KycError {
    pub fn kind(&self) -> FailureKind {
        match self {
            KycError::Validation(_) => FailureKind::CheckInput,
            KycError::ProofGeneration(_) | KycError::Publish(_) => FailureKind::TryAgain,
            KycError::VerificationFailed(_) | KycError::InvalidCredential(_) => {
                FailureKind::Restart
            }
            KycError::ExpiredCredential { .. } => FailureKind::Expired,
            KycError::Serialization(_) | KycError::Config(_) => FailureKind::Internal,
        }
    }

    /// Whether the failed step may be re-invoked as is
    pub fn is_retriable(&self) -> bool {
        self.kind() == FailureKind::TryAgain
    }
}

impl From<serde_json::Error> for KycError {
    fn from(err: serde_json::Error) -> Self {
        KycError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for KycError {
    fn from(err: config::ConfigError) -> Self {
        KycError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds_are_distinct() {
        assert_eq!(
            KycError::Validation("age".into()).kind(),
            FailureKind::CheckInput
        );
        assert_eq!(
            KycError::ProofGeneration("oom".into()).kind(),
            FailureKind::TryAgain
        );
        assert_eq!(
            KycError::VerificationFailed("bad".into()).kind(),
            FailureKind::Restart
        );
        assert!(KycError::Publish("timeout".into()).is_retriable());
        assert!(!KycError::Validation("age".into()).is_retriable());
    }
}
