//! Attestation key commands

use std::path::{Path, PathBuf};

use anyhow::Result;
use blocki_core::KycError;
use console::style;

use super::{load_config, open_key_store, passphrase};

/// Create the key pair in `dir`, or unlock the one already there
pub async fn init(config: Option<&Path>, dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let dir = dir.unwrap_or(config.prover.key_dir);
    let store = open_key_store(&dir)?;

    let existing = store.has_keys();
    let keypair = store
        .load_or_generate(&passphrase(!existing)?)
        .map_err(KycError::from)?;

    println!();
    if existing {
        println!("{}", style("✓ Attestation key unlocked").green().bold());
    } else {
        println!("{}", style("✓ Attestation key created").green().bold());
    }
    println!();
    println!("  Directory:       {}", style(store.dir().display()).yellow());
    println!(
        "  Verification key: {}",
        style(keypair.public_key.key_id()).cyan()
    );

    Ok(())
}
