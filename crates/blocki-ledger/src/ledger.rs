//! Ledger abstraction

use std::sync::Arc;
use std::time::Duration;

use blocki_core::config::{LedgerKind, LedgerSettings};
use blocki_core::{Commitment, KycError, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::HttpLedger;
use crate::memory::InMemoryLedger;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger rejected the commitment: {0}")]
    Rejected(String),

    #[error("Ledger did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Invalid ledger response: {0}")]
    InvalidResponse(String),
}

impl PublishError {
    /// Whether submitting the same record again may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, PublishError::Unavailable(_) | PublishError::Timeout(_))
    }
}

impl From<PublishError> for KycError {
    fn from(err: PublishError) -> Self {
        KycError::Publish(err.to_string())
    }
}

/// Ledger-specific reference to a submitted commitment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(pub String);

impl TransactionRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What gets written to the ledger
///
/// Carries the subject's public identifier only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentRecord {
    pub commitment: Commitment,
    pub subject: SubjectId,
    pub submitted_at: DateTime<Utc>,
}

impl CommitmentRecord {
    pub fn new(commitment: Commitment, subject: SubjectId) -> Self {
        Self {
            commitment,
            subject,
            submitted_at: Utc::now(),
        }
    }
}

/// Append-only commitment ledger
///
/// Delivery is at-least-once: the same record may be submitted more than
/// once and implementations decide how resubmissions are handled.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    async fn publish_commitment(
        &self,
        record: &CommitmentRecord,
    ) -> Result<TransactionRef, PublishError>;

    fn name(&self) -> &str;
}

/// Build the ledger named in configuration
pub fn ledger_from_config(settings: &LedgerSettings) -> Result<Arc<dyn Ledger>, KycError> {
    match settings.kind {
        LedgerKind::Memory => Ok(Arc::new(InMemoryLedger::new())),
        LedgerKind::Http => {
            let endpoint = settings.endpoint.clone().ok_or_else(|| {
                KycError::Config("ledger.endpoint is required for the http ledger".into())
            })?;
            Ok(Arc::new(HttpLedger::new(endpoint)))
        }
    }
}

/// Build the configured ledger for a one-shot process
///
/// An in-memory ledger does not outlive the process that publishes to it,
/// so it is refused here.
pub fn durable_ledger_from_config(settings: &LedgerSettings) -> Result<Arc<dyn Ledger>, KycError> {
    if settings.kind == LedgerKind::Memory {
        return Err(KycError::Config(
            "the in-memory ledger is not persisted; configure ledger.kind = \"http\" and ledger.endpoint"
                .into(),
        ));
    }
    ledger_from_config(settings)
}
