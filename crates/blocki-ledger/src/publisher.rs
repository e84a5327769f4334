//! Commitment publisher
//!
//! Computes the commitment for a proof artifact and submits it to a ledger,
//! bounding each attempt with a timeout and retrying transient failures.

use std::sync::Arc;
use std::time::Duration;

use blocki_core::config::LedgerSettings;
use blocki_core::{Commitment, ProofArtifact, SubjectId};
use serde::{Deserialize, Serialize};

use crate::ledger::{CommitmentRecord, Ledger, PublishError, TransactionRef};
use crate::retry::{Retry, RetryConfig};

/// Default per-attempt timeout
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of a successful publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub commitment: Commitment,
    pub transaction: TransactionRef,
    pub attempts: u32,
}

/// Publishes proof commitments to a ledger
#[derive(Clone)]
pub struct CommitmentPublisher {
    ledger: Arc<dyn Ledger>,
    retry: RetryConfig,
    attempt_timeout: Duration,
}

impl CommitmentPublisher {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self {
            ledger,
            retry: RetryConfig::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn from_settings(ledger: Arc<dyn Ledger>, settings: &LedgerSettings) -> Self {
        Self {
            ledger,
            retry: RetryConfig::from_settings(settings),
            attempt_timeout: Duration::from_millis(settings.timeout_ms),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn ledger_name(&self) -> &str {
        self.ledger.name()
    }

    /// Commit to `artifact` on the ledger on behalf of `subject`
    pub async fn publish(
        &self,
        artifact: &ProofArtifact,
        subject: &SubjectId,
    ) -> Result<PublishReceipt, PublishError> {
        self.publish_commitment(artifact.commitment(), subject).await
    }

    /// Submit an already computed commitment
    ///
    /// Safe to call again with the same commitment after a failure.
    pub async fn publish_commitment(
        &self,
        commitment: Commitment,
        subject: &SubjectId,
    ) -> Result<PublishReceipt, PublishError> {
        let record = CommitmentRecord::new(commitment, subject.clone());

        let outcome = Retry::new(self.retry.clone())
            .run_with_predicate(|| self.attempt(&record), PublishError::is_retriable)
            .await;
        let attempts = outcome.attempts;

        match outcome.result {
            Ok(transaction) => {
                tracing::info!(
                    ledger = self.ledger.name(),
                    commitment = %commitment,
                    transaction = %transaction,
                    attempts,
                    "Published commitment"
                );
                Ok(PublishReceipt {
                    commitment,
                    transaction,
                    attempts,
                })
            }
            Err(e) => {
                tracing::error!(
                    ledger = self.ledger.name(),
                    commitment = %commitment,
                    attempts,
                    error = %e,
                    "Failed to publish commitment"
                );
                Err(e)
            }
        }
    }

    async fn attempt(&self, record: &CommitmentRecord) -> Result<TransactionRef, PublishError> {
        match tokio::time::timeout(self.attempt_timeout, self.ledger.publish_commitment(record))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(self.attempt_timeout)),
        }
    }
}

impl std::fmt::Debug for CommitmentPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitmentPublisher")
            .field("ledger", &self.ledger.name())
            .field("retry", &self.retry)
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    enum Step {
        Fail(PublishError),
        Hang,
    }

    /// Plays a scripted sequence of failures, then defers to an in-memory ledger
    struct FlakyLedger {
        script: Mutex<VecDeque<Step>>,
        calls: AtomicU32,
        inner: InMemoryLedger,
    }

    impl FlakyLedger {
        fn new(script: Vec<Step>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                inner: InMemoryLedger::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl Ledger for FlakyLedger {
        async fn publish_commitment(
            &self,
            record: &CommitmentRecord,
        ) -> Result<TransactionRef, PublishError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self.script.lock().unwrap().pop_front();
            match step {
                Some(Step::Fail(e)) => Err(e),
                Some(Step::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(PublishError::Unavailable("woke up".into()))
                }
                None => self.inner.publish_commitment(record).await,
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn publisher(ledger: Arc<FlakyLedger>) -> CommitmentPublisher {
        CommitmentPublisher::new(ledger)
            .with_retry(RetryConfig::fast())
            .with_timeout(Duration::from_millis(50))
    }

    fn subject() -> SubjectId {
        SubjectId::new("0x71C7656EC7ab88b098defB751B7401B5f6d8976F")
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let ledger = Arc::new(FlakyLedger::new(vec![
            Step::Fail(PublishError::Unavailable("503".into())),
            Step::Fail(PublishError::Unavailable("connection reset".into())),
        ]));

        let receipt = publisher(ledger.clone())
            .publish_commitment(Commitment([1; 32]), &subject())
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 3);
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 3);
        assert!(ledger.inner.contains(&Commitment([1; 32])));
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let ledger = Arc::new(FlakyLedger::new(vec![Step::Fail(PublishError::Rejected(
            "400".into(),
        ))]));

        let err = publisher(ledger.clone())
            .publish_commitment(Commitment([2; 32]), &subject())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Rejected(_)));
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 1);
        assert!(ledger.inner.is_empty());
    }

    #[tokio::test]
    async fn test_hung_attempt_times_out_then_retries() {
        let ledger = Arc::new(FlakyLedger::new(vec![Step::Hang]));

        let receipt = publisher(ledger.clone())
            .publish_commitment(Commitment([3; 32]), &subject())
            .await
            .unwrap();

        assert_eq!(receipt.attempts, 2);
    }

    #[tokio::test]
    async fn test_timeout_when_retries_exhausted() {
        let ledger = Arc::new(FlakyLedger::new(vec![Step::Hang, Step::Hang]));

        let err = publisher(ledger.clone())
            .with_retry(RetryConfig::fast().with_max_retries(1))
            .publish_commitment(Commitment([4; 32]), &subject())
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Timeout(_)));
        assert_eq!(ledger.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resubmission_returns_same_transaction() {
        let ledger = Arc::new(FlakyLedger::new(Vec::new()));
        let publisher = publisher(ledger.clone());

        let first = publisher
            .publish_commitment(Commitment([5; 32]), &subject())
            .await
            .unwrap();
        let second = publisher
            .publish_commitment(Commitment([5; 32]), &subject())
            .await
            .unwrap();

        assert_eq!(first.transaction, second.transaction);
        assert_eq!(ledger.inner.len(), 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = LedgerSettings {
            timeout_ms: 2_500,
            max_retries: 2,
            ..Default::default()
        };
        let publisher = CommitmentPublisher::from_settings(Arc::new(InMemoryLedger::new()), &settings);
        assert_eq!(publisher.attempt_timeout, Duration::from_millis(2_500));
        assert_eq!(publisher.retry.max_retries, 2);
        assert_eq!(publisher.ledger_name(), "memory");
    }
}
