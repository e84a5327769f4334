//! Workflow configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `blocki.toml` (or an explicit file), then `BLOCKI_*` environment
//! variables with `__` as the section separator, e.g.
//! `BLOCKI_LEDGER__ENDPOINT=https://ledger.example/commitments`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::claim::{ApprovedRegions, DEFAULT_APPROVED_REGIONS};
use crate::credential::{DEFAULT_VALIDITY_DAYS, MAX_VALIDITY_DAYS};
use crate::error::KycError;
use crate::issuer::IssuerId;
use crate::policy::AccessPolicy;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KycConfig {
    pub issuer: IssuerSettings,

    /// Approved residency regions
    pub regions: Vec<String>,

    pub prover: ProverSettings,

    pub ledger: LedgerSettings,

    pub policy: PolicySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuerSettings {
    pub id: String,
    pub validity_days: i64,
}

impl Default for IssuerSettings {
    fn default() -> Self {
        Self {
            id: IssuerId::DEFAULT.to_string(),
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProverSettings {
    /// Backend name: "attested"
    pub backend: String,

    /// Directory holding the attestation key pair
    pub key_dir: PathBuf,
}

impl Default for ProverSettings {
    fn default() -> Self {
        Self {
            backend: "attested".to_string(),
            key_dir: PathBuf::from(".blocki/keys"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerKind {
    Memory,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub kind: LedgerKind,

    /// Endpoint for the HTTP ledger
    pub endpoint: Option<Url>,

    /// Per-attempt timeout
    pub timeout_ms: u64,

    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            kind: LedgerKind::Memory,
            endpoint: None,
            timeout_ms: 10_000,
            max_retries: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub require_prior_verification: bool,
}

impl Default for KycConfig {
    fn default() -> Self {
        Self {
            issuer: IssuerSettings::default(),
            regions: DEFAULT_APPROVED_REGIONS
                .iter()
                .map(|r| r.to_string())
                .collect(),
            prover: ProverSettings::default(),
            ledger: LedgerSettings::default(),
            policy: PolicySettings::default(),
        }
    }
}

impl KycConfig {
    /// Load configuration from defaults, an optional file and the environment
    ///
    /// Without an explicit `path`, `blocki.toml` in the working directory is
    /// read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, KycError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name("blocki").required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("BLOCKI")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("regions")
                    .try_parsing(true),
            )
            .build()?;

        let config: KycConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), KycError> {
        if !(1..=MAX_VALIDITY_DAYS).contains(&self.issuer.validity_days) {
            return Err(KycError::Config(format!(
                "issuer.validity_days must be between 1 and {}",
                MAX_VALIDITY_DAYS
            )));
        }
        if self.regions.iter().all(|r| r.trim().is_empty()) {
            return Err(KycError::Config("regions must not be empty".into()));
        }
        if self.ledger.kind == LedgerKind::Http && self.ledger.endpoint.is_none() {
            return Err(KycError::Config(
                "ledger.endpoint is required for the http ledger".into(),
            ));
        }
        if self.ledger.timeout_ms == 0 {
            return Err(KycError::Config("ledger.timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn approved_regions(&self) -> ApprovedRegions {
        ApprovedRegions::new(
            self.regions
                .iter()
                .map(|r| r.trim())
                .filter(|r| !r.is_empty()),
        )
    }

    pub fn issuer_id(&self) -> IssuerId {
        IssuerId::new(self.issuer.id.clone())
    }

    pub fn validity(&self) -> Result<chrono::Duration, KycError> {
        chrono::Duration::try_days(self.issuer.validity_days).ok_or_else(|| {
            KycError::Config("issuer.validity_days is out of range".into())
        })
    }

    pub fn access_policy(&self) -> AccessPolicy {
        if self.policy.require_prior_verification {
            AccessPolicy::default().with_prior_verification()
        } else {
            AccessPolicy::default()
        }
    }
}
