//! Circuit definitions and metadata

use blocki_core::ClaimName;
use serde::{Deserialize, Serialize};

/// Type of circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitType {
    /// Proves the three KYC eligibility claims
    KycEligibility,
}

impl CircuitType {
    /// Get the circuit identifier string
    pub fn id(&self) -> &'static str {
        match self {
            CircuitType::KycEligibility => "kyc_eligibility_v1",
        }
    }

    /// Parse from string
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "kyc_eligibility_v1" => Some(CircuitType::KycEligibility),
            _ => None,
        }
    }

    /// Number of public signals a proof for this circuit carries
    pub fn public_input_count(&self) -> usize {
        match self {
            CircuitType::KycEligibility => ClaimName::ALL.len(),
        }
    }
}

impl std::fmt::Display for CircuitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Circuit metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circuit {
    pub circuit_type: CircuitType,
    pub version: String,
    pub description: String,

    /// Names of the public signals, in order
    pub public_inputs: Vec<String>,
}

impl Circuit {
    pub fn kyc_eligibility() -> Self {
        Self {
            circuit_type: CircuitType::KycEligibility,
            version: "1.0.0".to_string(),
            description: "Proves age, residency and prior verification claims without revealing the inputs"
                .to_string(),
            public_inputs: ClaimName::ALL
                .iter()
                .map(|name| name.as_str().to_string())
                .collect(),
        }
    }
}
