//! Proof types for Blocki KYC
//!
//! A proof artifact is immutable once generated. Its payload is opaque to
//! everything except the proving backend that produced it and the verifier
//! holding the matching verification key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::claim::ClaimName;
use crate::error::KycError;

/// Unique identifier for a proof artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProofId(pub String);

impl ProofId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("prf_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for ProofId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a published verification key (`vk_` + hex SHA3-256 of the key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationKeyId(pub String);

impl VerificationKeyId {
    pub const PREFIX: &'static str = "vk_";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive the identifier from raw verification key bytes
    pub fn from_key_bytes(key: &[u8]) -> Self {
        let digest: [u8; 32] = Sha3_256::digest(key).into();
        Self(format!("{}{}", Self::PREFIX, hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VerificationKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ordered public signals a proof attests to
///
/// One `"true"`/`"false"` string per [`ClaimName`], in `ClaimName::ALL` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicSignals(Vec<String>);

impl PublicSignals {
    pub fn new(signals: Vec<String>) -> Self {
        Self(signals)
    }

    pub fn from_values(values: impl IntoIterator<Item = bool>) -> Self {
        Self(values.into_iter().map(|v| v.to_string()).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a claim's attested value
    ///
    /// Returns `None` when the signal is missing or is not a boolean literal.
    pub fn claim(&self, name: ClaimName) -> Option<bool> {
        match self.0.get(name.index()).map(String::as_str) {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

/// A generated proof artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub id: ProofId,

    /// Circuit identifier the payload was produced for
    pub circuit_id: String,

    /// Opaque proof bytes
    #[serde(with = "b64_bytes")]
    pub payload: Vec<u8>,

    pub public_signals: PublicSignals,

    /// Key the payload verifies against
    pub verification_key: VerificationKeyId,

    pub generated_at: DateTime<Utc>,
}

impl ProofArtifact {
    /// Canonical byte encoding covered by the commitment
    ///
    /// Every field is length-prefixed so no two artifacts share an encoding.
    /// The id and generation time are bookkeeping and are excluded.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 256);
        push_field(&mut out, self.circuit_id.as_bytes());
        push_field(&mut out, &self.payload);
        out.extend_from_slice(&(self.public_signals.len() as u32).to_be_bytes());
        for signal in self.public_signals.as_slice() {
            push_field(&mut out, signal.as_bytes());
        }
        push_field(&mut out, self.verification_key.as_str().as_bytes());
        out
    }

    /// Commitment to this artifact
    pub fn commitment(&self) -> Commitment {
        let mut hasher = Sha3_256::new();
        hasher.update(b"blocki:commitment:v1:");
        hasher.update(self.canonical_bytes());
        Commitment(hasher.finalize().into())
    }

    pub fn size_bytes(&self) -> usize {
        self.payload.len()
    }

    pub fn to_json(&self) -> Result<String, KycError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, KycError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn push_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// 32-byte SHA3-256 commitment to a proof artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, KycError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| KycError::Serialization(format!("commitment: {}", e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| KycError::Serialization("commitment must be 32 bytes".into()))?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Commitment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Commitment::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Base64 serialization for opaque byte payloads
mod b64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
