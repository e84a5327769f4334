//! Witness construction for the KYC circuit

use blocki_core::{ClaimName, Claims, PublicSignals};
use blocki_crypto::hash::{random_bytes, tagged_hash};
use chrono::{DateTime, Utc};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::circuit::CircuitType;
use crate::prover::ProverError;

/// Private half of the witness; never leaves the prover
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateWitness {
    salt: [u8; 32],
    claim_bits: [bool; 3],
    evaluated_at: i64,
}

impl std::fmt::Debug for PrivateWitness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateWitness([REDACTED])")
    }
}

/// Witness data for circuit execution
#[derive(Debug, Clone)]
pub struct Witness {
    pub circuit_type: CircuitType,
    private: PrivateWitness,
    public_signals: PublicSignals,
}

impl Witness {
    pub fn public_signals(&self) -> &PublicSignals {
        &self.public_signals
    }

    /// Salted commitment to the private witness
    ///
    /// This is the only value derived from the private part that is placed
    /// in a proof payload.
    pub fn commitment(&self) -> [u8; 32] {
        let bits: Vec<u8> = self.private.claim_bits.iter().map(|b| *b as u8).collect();
        tagged_hash(
            "blocki:witness:v1",
            &[
                self.circuit_type.id().as_bytes(),
                &self.private.salt,
                &bits,
                &self.private.evaluated_at.to_be_bytes(),
            ],
        )
    }
}

/// Builder for the KYC eligibility witness
#[derive(Default)]
pub struct KycWitnessBuilder {
    claims: Option<[bool; 3]>,
    evaluated_at: Option<DateTime<Utc>>,
    salt: Option<[u8; 32]>,
}

impl KycWitnessBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claims(mut self, claims: &Claims) -> Self {
        self.claims = Some(ClaimName::ALL.map(|name| claims.get(name)));
        self.evaluated_at = Some(claims.evaluated_at);
        self
    }

    /// Fix the salt; a fresh random salt is drawn otherwise
    pub fn salt(mut self, salt: [u8; 32]) -> Self {
        self.salt = Some(salt);
        self
    }

    pub fn build(self) -> Result<Witness, ProverError> {
        let claim_bits = self
            .claims
            .ok_or_else(|| ProverError::InvalidWitness("claims required".into()))?;
        let evaluated_at = self
            .evaluated_at
            .ok_or_else(|| ProverError::InvalidWitness("evaluation time required".into()))?;

        Ok(Witness {
            circuit_type: CircuitType::KycEligibility,
            private: PrivateWitness {
                salt: self.salt.unwrap_or_else(random_bytes),
                claim_bits,
                evaluated_at: evaluated_at.timestamp(),
            },
            public_signals: PublicSignals::from_values(claim_bits),
        })
    }
}
