//! Subject sessions
//!
//! A session ties a subject to the credential token it presents. Stores are
//! injected by the caller; there is no process-wide session state.

use std::collections::HashMap;
use std::sync::RwLock;

use blocki_core::{Credential, KycError, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::WalletError;

/// An authenticated subject session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub subject: SubjectId,
    pub credential_token: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Open a session presenting `credential`
    pub fn for_credential(credential: &Credential) -> Result<Self, KycError> {
        Ok(Self {
            subject: credential.subject().clone(),
            credential_token: credential.to_token()?,
            created_at: Utc::now(),
        })
    }

    /// Decode the presented credential
    pub fn credential(&self) -> Result<Credential, KycError> {
        Credential::from_token(&self.credential_token)
    }
}

/// Storage for sessions, keyed by subject
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, subject: &SubjectId) -> Result<Option<Session>, WalletError>;

    /// Create or replace the subject's session
    async fn set(&self, session: Session) -> Result<(), WalletError>;

    /// End the subject's session; returns whether one existed
    async fn clear(&self, subject: &SubjectId) -> Result<bool, WalletError>;
}

/// In-memory session store (for development/testing)
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SubjectId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, subject: &SubjectId) -> Result<Option<Session>, WalletError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|e| WalletError::Storage(e.to_string()))?;
        Ok(sessions.get(subject).cloned())
    }

    async fn set(&self, session: Session) -> Result<(), WalletError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| WalletError::Storage(e.to_string()))?;
        tracing::debug!(subject = %session.subject.short(), "Session started");
        sessions.insert(session.subject.clone(), session);
        Ok(())
    }

    async fn clear(&self, subject: &SubjectId) -> Result<bool, WalletError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| WalletError::Storage(e.to_string()))?;
        Ok(sessions.remove(subject).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocki_core::{IssuerId, ProofArtifact, ProofId, PublicSignals, VerificationKeyId};
    use chrono::Duration;

    fn credential(subject: &str) -> Credential {
        let now = Utc::now();
        let artifact = ProofArtifact {
            id: ProofId::generate(),
            circuit_id: "kyc_eligibility_v1".to_string(),
            payload: vec![0u8; 4],
            public_signals: PublicSignals::from_values([true, true, false]),
            verification_key: VerificationKeyId::new("vk_fixture"),
            generated_at: now,
        };
        Credential::new(
            artifact,
            IssuerId::default(),
            SubjectId::new(subject),
            now,
            Duration::days(90),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = InMemorySessionStore::new();
        let cred = credential("alice");
        let subject = cred.subject().clone();

        assert!(store.get(&subject).await.unwrap().is_none());

        store.set(Session::for_credential(&cred).unwrap()).await.unwrap();
        let session = store.get(&subject).await.unwrap().unwrap();
        assert_eq!(session.credential().unwrap(), cred);

        assert!(store.clear(&subject).await.unwrap());
        assert!(!store.clear(&subject).await.unwrap());
        assert!(store.get(&subject).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated_by_subject() {
        let store = InMemorySessionStore::new();
        store
            .set(Session::for_credential(&credential("alice")).unwrap())
            .await
            .unwrap();
        store
            .set(Session::for_credential(&credential("bob")).unwrap())
            .await
            .unwrap();

        store.clear(&SubjectId::new("alice")).await.unwrap();
        assert!(store.get(&SubjectId::new("bob")).await.unwrap().is_some());
    }
}
