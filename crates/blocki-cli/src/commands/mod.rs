//! CLI command implementations

pub mod credential;
pub mod keys;
pub mod kyc;
pub mod status;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use blocki_core::{KycConfig, KycError, ProofArtifact, SubjectId};
use blocki_crypto::{DilithiumKeypair, KeyStore};
use blocki_prover::{VerificationKeyRegistry, Verifier};
use blocki_wallet::{IdentityProvider, StaticIdentity};
use dialoguer::Password;

const PASSPHRASE_ENV: &str = "BLOCKI_KEY_PASSPHRASE";

pub(crate) fn load_config(path: Option<&Path>) -> Result<KycConfig> {
    Ok(KycConfig::load(path)?)
}

pub(crate) fn open_key_store(dir: &Path) -> Result<KeyStore> {
    Ok(KeyStore::open(dir).map_err(KycError::from)?)
}

/// Passphrase from the environment, or prompted for
pub(crate) fn passphrase(confirm: bool) -> Result<String> {
    if let Ok(passphrase) = std::env::var(PASSPHRASE_ENV) {
        return Ok(passphrase);
    }

    let prompt = Password::new().with_prompt("Key passphrase");
    let prompt = if confirm {
        prompt.with_confirmation("Repeat passphrase", "Passphrases do not match")
    } else {
        prompt
    };
    prompt.interact().context("reading passphrase")
}

pub(crate) fn unlock_keypair(config: &KycConfig) -> Result<DilithiumKeypair> {
    let store = open_key_store(&config.prover.key_dir)?;
    let keypair = store
        .load(&passphrase(false)?)
        .map_err(KycError::from)?;
    Ok(keypair)
}

/// Verifier trusting the configured attestation key
pub(crate) fn verifier(config: &KycConfig) -> Result<Verifier> {
    let store = open_key_store(&config.prover.key_dir)?;
    let registry = VerificationKeyRegistry::from_key_store(&store).map_err(KycError::from)?;
    Ok(Verifier::new(registry))
}

pub(crate) fn read_artifact(path: &Path) -> Result<ProofArtifact> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading proof file {}", path.display()))?;
    Ok(ProofArtifact::from_json(&json)?)
}

pub(crate) async fn subject(identifier: Option<String>) -> Result<SubjectId> {
    let provider = match identifier {
        Some(id) => StaticIdentity::new(id),
        None => StaticIdentity::disconnected(),
    };
    let subject = provider
        .public_identifier()
        .await
        .map_err(KycError::from)?;
    Ok(subject)
}
