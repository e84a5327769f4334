//! Claim types and the claim evaluator
//!
//! Claims are the boolean facts a proof attests to. They are derived from
//! private inputs that never leave the subject's trust boundary: the raw
//! inputs are wiped on drop and redacted from `Debug` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KycError;
use crate::proof::PublicSignals;

/// Minimum age for the `isOver18` claim
pub const ADULT_AGE: i64 = 18;

/// Upper bound accepted for an age input
pub const MAX_AGE: i64 = 150;

/// Regions approved for marketplace residency
pub const DEFAULT_APPROVED_REGIONS: &[&str] = &[
    "Argentina",
    "Brasil",
    "Chile",
    "Colombia",
    "Perú",
    "México",
    "Venezuela",
    "Ecuador",
    "Bolivia",
    "Paraguay",
    "Uruguay",
    "Panamá",
    "Costa Rica",
    "El Salvador",
    "Guatemala",
    "Honduras",
    "Nicaragua",
    "República Dominicana",
    "Cuba",
    "Puerto Rico",
];

/// Names of the claims, in public signal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimName {
    IsOver18,
    IsApprovedRegion,
    IsPriorVerified,
}

impl ClaimName {
    pub const ALL: [ClaimName; 3] = [
        ClaimName::IsOver18,
        ClaimName::IsApprovedRegion,
        ClaimName::IsPriorVerified,
    ];

    /// Position of this claim in the public signals
    pub fn index(&self) -> usize {
        match self {
            ClaimName::IsOver18 => 0,
            ClaimName::IsApprovedRegion => 1,
            ClaimName::IsPriorVerified => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimName::IsOver18 => "isOver18",
            ClaimName::IsApprovedRegion => "isApprovedRegion",
            ClaimName::IsPriorVerified => "isPriorVerified",
        }
    }
}

impl std::fmt::Display for ClaimName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Private inputs to the claim evaluator
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KycInput {
    age: i64,
    region: String,
    prior_verified: bool,
}

impl KycInput {
    /// Create validated inputs
    ///
    /// Fails on a negative or implausible age and on an empty region.
    pub fn new(
        age: i64,
        region: impl Into<String>,
        prior_verified: bool,
    ) -> Result<Self, KycError> {
        if age < 0 {
            return Err(KycError::Validation("age must not be negative".into()));
        }
        if age > MAX_AGE {
            return Err(KycError::Validation(format!(
                "age must be at most {}",
                MAX_AGE
            )));
        }

        let region = region.into().trim().to_string();
        if region.is_empty() {
            return Err(KycError::Validation("region must not be empty".into()));
        }

        Ok(Self {
            age,
            region,
            prior_verified,
        })
    }

    /// Create inputs from untyped text (e.g. form fields)
    pub fn parse(
        age: &str,
        region: impl Into<String>,
        prior_verified: bool,
    ) -> Result<Self, KycError> {
        let age: i64 = age
            .trim()
            .parse()
            .map_err(|_| KycError::Validation("age must be a whole number".into()))?;
        Self::new(age, region, prior_verified)
    }

    pub fn age(&self) -> i64 {
        self.age
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn prior_verified(&self) -> bool {
        self.prior_verified
    }
}

impl std::fmt::Debug for KycInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KycInput([REDACTED])")
    }
}

/// Allow-list of approved residency regions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedRegions(Vec<String>);

impl ApprovedRegions {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(regions.into_iter().map(Into::into).collect())
    }

    /// Exact, case-insensitive membership test
    pub fn contains(&self, region: &str) -> bool {
        let needle = region.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.0.iter().any(|r| r.to_lowercase() == needle)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for ApprovedRegions {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVED_REGIONS.iter().copied())
    }
}

/// Eligibility claims derived from private inputs
///
/// Deliberately not `Serialize`: claims only leave the evaluator as
/// public signals inside a proof artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub is_over_18: bool,
    pub is_approved_region: bool,
    pub is_prior_verified: bool,
    pub evaluated_at: DateTime<Utc>,
}

impl Claims {
    pub fn get(&self, name: ClaimName) -> bool {
        match name {
            ClaimName::IsOver18 => self.is_over_18,
            ClaimName::IsApprovedRegion => self.is_approved_region,
            ClaimName::IsPriorVerified => self.is_prior_verified,
        }
    }

    /// Public signals for this set of claims
    pub fn public_signals(&self) -> PublicSignals {
        PublicSignals::from_values(ClaimName::ALL.map(|name| self.get(name)))
    }
}

/// Derives [`Claims`] from [`KycInput`]
#[derive(Debug, Clone, Default)]
pub struct ClaimEvaluator {
    regions: ApprovedRegions,
}

impl ClaimEvaluator {
    pub fn new(regions: ApprovedRegions) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &ApprovedRegions {
        &self.regions
    }

    /// Evaluate the claims for a subject's private inputs
    pub fn evaluate(&self, input: &KycInput) -> Claims {
        self.evaluate_at(input, Utc::now())
    }

    pub fn evaluate_at(&self, input: &KycInput, evaluated_at: DateTime<Utc>) -> Claims {
        Claims {
            is_over_18: input.age() >= ADULT_AGE,
            is_approved_region: self.regions.contains(input.region()),
            is_prior_verified: input.prior_verified(),
            evaluated_at,
        }
    }
}
