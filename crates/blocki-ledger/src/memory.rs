//! In-memory ledger (for development/testing)

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use blocki_core::Commitment;
use blocki_crypto::hash::tagged_hash;

use crate::ledger::{CommitmentRecord, Ledger, PublishError, TransactionRef};

/// One appended ledger entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub index: u64,
    pub record: CommitmentRecord,
    pub transaction: TransactionRef,
}

#[derive(Default)]
struct Inner {
    entries: Vec<LedgerEntry>,
    by_commitment: HashMap<Commitment, usize>,
}

/// Append-only in-memory ledger
///
/// Resubmitting a commitment returns the transaction of its first entry.
/// Every update leaves the log consistent, so a poisoned lock is recovered
/// rather than reported.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<Inner>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries, in append order
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .clone()
    }

    pub fn contains(&self, commitment: &Commitment) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .by_commitment
            .contains_key(commitment)
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn transaction_ref(index: u64, commitment: &Commitment) -> TransactionRef {
    let digest = tagged_hash(
        "blocki:ledger:tx",
        &[&index.to_be_bytes(), commitment.as_bytes()],
    );
    TransactionRef(format!("0x{}", hex::encode(digest)))
}

#[async_trait::async_trait]
impl Ledger for InMemoryLedger {
    async fn publish_commitment(
        &self,
        record: &CommitmentRecord,
    ) -> Result<TransactionRef, PublishError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(&position) = inner.by_commitment.get(&record.commitment) {
            let existing = inner.entries[position].transaction.clone();
            tracing::debug!(
                commitment = %record.commitment,
                transaction = %existing,
                "Commitment already on ledger"
            );
            return Ok(existing);
        }

        let index = inner.entries.len() as u64;
        let transaction = transaction_ref(index, &record.commitment);
        inner.entries.push(LedgerEntry {
            index,
            record: record.clone(),
            transaction: transaction.clone(),
        });
        let position = inner.entries.len() - 1;
        inner.by_commitment.insert(record.commitment, position);

        Ok(transaction)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
