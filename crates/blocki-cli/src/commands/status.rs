//! Status command - show configuration and status

use std::path::Path;

use anyhow::Result;
use blocki_core::config::LedgerKind;
use console::style;

use super::{load_config, open_key_store};

pub async fn show(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;

    println!(
        "\n{}",
        style("╔════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║   Blocki KYC Status                    ║").cyan()
    );
    println!(
        "{}",
        style("╚════════════════════════════════════════╝").cyan()
    );
    println!();

    println!("{}", style("Version").bold().underlined());
    println!("  blocki-cli:      {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("{}", style("Issuer").bold().underlined());
    println!("  Id:              {}", config.issuer_id());
    println!("  Validity:        {} days", config.issuer.validity_days);
    let required: Vec<&str> = config
        .access_policy()
        .required()
        .iter()
        .map(|c| c.as_str())
        .collect();
    println!("  Access requires: {}", required.join(", "));
    println!();

    println!("{}", style("Prover").bold().underlined());
    println!("  Backend:         {}", style(&config.prover.backend).cyan());
    let store = open_key_store(&config.prover.key_dir)?;
    println!(
        "  Key store:       {} ({})",
        store.dir().display(),
        if store.has_keys() {
            style("initialized").green()
        } else {
            style("run `blocki keys init`").yellow()
        }
    );
    println!();

    println!("{}", style("Ledger").bold().underlined());
    match config.ledger.kind {
        LedgerKind::Memory => {
            println!("  Kind:            {}", style("memory (development)").yellow());
        }
        LedgerKind::Http => {
            println!("  Kind:            {}", style("http").green());
            if let Some(endpoint) = &config.ledger.endpoint {
                println!("  Endpoint:        {}", endpoint);
            }
        }
    }
    println!(
        "  Timeout:         {} ms x {} retries",
        config.ledger.timeout_ms, config.ledger.max_retries
    );
    println!();

    println!("{}", style("Approved Regions").bold().underlined());
    println!("  {}", config.regions.join(", "));
    println!();

    println!("{}", style("Cryptography").bold().underlined());
    println!("  Attestation:     Dilithium3 (NIST ML-DSA)");
    println!("  Hash:            SHA3-256");
    println!();

    println!("{}", style("Quick Start").bold().underlined());
    println!("  Create key:      blocki keys init");
    println!("  Generate proof:  blocki kyc prove --age 25 --region Argentina -o proof.json");
    println!("  Issue:           blocki credential issue proof.json --subject <id> -o cred.token");
    println!("  Show help:       blocki --help");

    Ok(())
}
