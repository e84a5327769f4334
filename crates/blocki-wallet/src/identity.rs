//! Subject identity

use blocki_core::SubjectId;

use crate::WalletError;

/// Source of the subject's public identifier, typically a wallet address
///
/// Only the public identifier is requested; no signing happens here.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn public_identifier(&self) -> Result<SubjectId, WalletError>;
}

/// Identity provider backed by a known identifier
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    identifier: Option<String>,
}

impl StaticIdentity {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: Some(identifier.into()),
        }
    }

    /// Provider with no connected identity
    pub fn disconnected() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for StaticIdentity {
    async fn public_identifier(&self) -> Result<SubjectId, WalletError> {
        let identifier = self.identifier.as_deref().ok_or(WalletError::NoIdentity)?;
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(WalletError::InvalidIdentifier(
                "identifier is empty".into(),
            ));
        }
        Ok(SubjectId::new(identifier))
    }
}
