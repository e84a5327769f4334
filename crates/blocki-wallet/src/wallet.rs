//! Credential wallet

use std::collections::HashMap;

use blocki_core::{Credential, SubjectId};
use chrono::{DateTime, Utc};

use crate::WalletError;

/// Credentials held on behalf of subjects
///
/// Credentials are never renewed in place; once expired they are dropped
/// and the subject has to go through verification again.
#[derive(Debug, Default)]
pub struct Wallet {
    credentials: HashMap<SubjectId, Vec<Credential>>,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a credential; expired credentials are refused
    pub fn store(&mut self, credential: Credential, now: DateTime<Utc>) -> Result<(), WalletError> {
        if credential.is_expired_at(now) {
            return Err(WalletError::CredentialExpired {
                expired_at: credential.expires_at(),
            });
        }

        tracing::debug!(credential_id = %credential.id(), "Stored credential");
        self.credentials
            .entry(credential.subject().clone())
            .or_default()
            .push(credential);
        Ok(())
    }

    /// Most recently issued credential still valid at `now`
    pub fn current(&self, subject: &SubjectId, now: DateTime<Utc>) -> Option<&Credential> {
        self.credentials
            .get(subject)?
            .iter()
            .filter(|c| !c.is_expired_at(now))
            .max_by_key(|c| c.issued_at())
    }

    pub fn list(&self, subject: &SubjectId) -> &[Credential] {
        self.credentials
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Drop every credential expired at `now`; returns how many were removed
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for held in self.credentials.values_mut() {
            let before = held.len();
            held.retain(|c| !c.is_expired_at(now));
            removed += before - held.len();
        }
        self.credentials.retain(|_, held| !held.is_empty());
        removed
    }

    pub fn len(&self) -> usize {
        self.credentials.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
