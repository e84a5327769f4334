//! Blocki Ledger
//!
//! Append-only commitment ledgers and the publisher that submits proof
//! commitments to them. Ledger failures are network failures; they never
//! say anything about the validity of a proof.

pub mod http;
pub mod ledger;
pub mod memory;
pub mod publisher;
pub mod retry;

pub use http::HttpLedger;
pub use ledger::{
    durable_ledger_from_config, ledger_from_config, CommitmentRecord, Ledger, PublishError,
    TransactionRef,
};
pub use memory::{InMemoryLedger, LedgerEntry};
pub use publisher::{CommitmentPublisher, PublishReceipt, DEFAULT_ATTEMPT_TIMEOUT};
pub use retry::{Retry, RetryConfig, RetryResult};
