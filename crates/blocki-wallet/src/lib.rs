//! Blocki Wallet
//!
//! Subject-side holder: identity, issued credentials and sessions.

pub mod identity;
pub mod session;
pub mod wallet;

use blocki_core::KycError;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use identity::{IdentityProvider, StaticIdentity};
pub use session::{InMemorySessionStore, Session, SessionStore};
pub use wallet::Wallet;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("No identity connected")]
    NoIdentity,

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Credential expired at {expired_at}")]
    CredentialExpired { expired_at: DateTime<Utc> },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<WalletError> for KycError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::CredentialExpired { expired_at } => {
                KycError::ExpiredCredential { expired_at }
            }
            WalletError::NoIdentity | WalletError::InvalidIdentifier(_) => {
                KycError::Validation(err.to_string())
            }
            WalletError::Storage(msg) => KycError::Serialization(msg),
        }
    }
}
