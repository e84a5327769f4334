//! Proof generation, verification and publishing commands

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use blocki_core::{ClaimName, KycError, KycInput, ProofArtifact};
use blocki_issuer::KycPipeline;
use blocki_ledger::{durable_ledger_from_config, CommitmentPublisher};
use blocki_prover::{CancelToken, Verification, VerifiedProof, Verifier};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use super::{load_config, read_artifact, subject, unlock_keypair, verifier};

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb.set_message(message);
    Ok(pb)
}

/// An invalid proof is a command failure
fn require_valid(verifier: &Verifier, artifact: ProofArtifact) -> Result<VerifiedProof, KycError> {
    match verifier.verify(artifact) {
        Verification::Valid(proof) => Ok(proof),
        Verification::Invalid { reason } => Err(KycError::VerificationFailed(reason)),
    }
}

fn print_signals(artifact: &ProofArtifact) {
    println!("{}", style("Public Signals:").bold());
    for name in ClaimName::ALL {
        let value = match artifact.public_signals.claim(name) {
            Some(true) => style("true").green(),
            Some(false) => style("false").red(),
            None => style("?").dim(),
        };
        println!("  {:<18} {}", name.as_str(), value);
    }
}

/// Evaluate the private input and write a proof file
pub async fn prove(
    config: Option<&Path>,
    age: &str,
    region: &str,
    prior_verified: bool,
    output: &Path,
) -> Result<()> {
    println!("\n{}", style("Generating KYC Proof").bold().underlined());
    println!();

    let input = KycInput::parse(age, region, prior_verified)?;
    let config = load_config(config)?;
    let keypair = unlock_keypair(&config)?;
    let pipeline = KycPipeline::from_config(&config, keypair)?;

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let pb = spinner("Generating proof...")?;
    let proof = pipeline.prove(&input, &cancel).await;
    pb.finish_and_clear();
    let proof = proof?;

    let artifact = proof.artifact();
    fs::write(output, artifact.to_json()?)?;

    println!("{}", style("✓ Proof generated and self-checked").green().bold());
    println!();
    println!("  Proof id:      {}", style(&artifact.id).cyan());
    println!("  Commitment:    {}", style(proof.commitment()).cyan());
    println!("  Proof size:    {} bytes", style(artifact.size_bytes()).cyan());
    println!("  Output file:   {}", style(output.display()).yellow());
    println!();
    print_signals(artifact);

    Ok(())
}

/// Verify a proof file against the configured verification key
pub async fn verify(config: Option<&Path>, proof_file: &Path) -> Result<()> {
    println!("\n{}", style("Verifying KYC Proof").bold().underlined());
    println!();

    let config = load_config(config)?;
    let artifact = read_artifact(proof_file)?;

    println!("  Circuit:       {}", style(&artifact.circuit_id).cyan());
    println!("  Proof file:    {}", proof_file.display());
    println!();

    let proof = match require_valid(&verifier(&config)?, artifact) {
        Ok(proof) => proof,
        Err(err) => {
            println!("{}", style("✗ Proof is INVALID").red().bold());
            return Err(err.into());
        }
    };

    println!("{}", style("✓ Proof is VALID").green().bold());
    println!();
    println!("  Commitment:    {}", style(proof.commitment()).cyan());
    println!();
    print_signals(proof.artifact());

    Ok(())
}

/// Verify a proof file and publish its commitment
pub async fn publish(
    config: Option<&Path>,
    proof_file: &Path,
    identifier: Option<String>,
) -> Result<()> {
    println!("\n{}", style("Publishing Commitment").bold().underlined());
    println!();

    let config = load_config(config)?;
    let subject = subject(identifier).await?;
    let artifact = read_artifact(proof_file)?;

    let proof = require_valid(&verifier(&config)?, artifact)?;

    let ledger = durable_ledger_from_config(&config.ledger)?;
    let publisher = CommitmentPublisher::from_settings(ledger, &config.ledger);

    println!("  Ledger:        {}", style(publisher.ledger_name()).cyan());
    println!("  Subject:       {}", style(subject.short()).cyan());
    println!();

    let pb = spinner("Submitting commitment...")?;
    let receipt = publisher.publish(proof.artifact(), &subject).await;
    pb.finish_and_clear();
    let receipt = receipt.map_err(KycError::from)?;

    println!("{}", style("✓ Commitment published").green().bold());
    println!();
    println!("  Commitment:    {}", style(receipt.commitment).cyan());
    println!("  Transaction:   {}", style(&receipt.transaction).yellow());
    println!("  Attempts:      {}", receipt.attempts);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocki_core::Claims;
    use blocki_crypto::DilithiumKeypair;
    use blocki_prover::{AttestedBackend, Prover, VerificationKeyRegistry};
    use chrono::Utc;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_invalid_proof_fails_the_command() {
        let keypair = DilithiumKeypair::generate();
        let verifier = Verifier::new(VerificationKeyRegistry::with_key(keypair.public_key.clone()));
        let prover = Prover::new(Arc::new(AttestedBackend::new(keypair)));
        let claims = Claims {
            is_over_18: true,
            is_approved_region: true,
            is_prior_verified: true,
            evaluated_at: Utc::now(),
        };
        let artifact = prover.generate(&claims, &CancelToken::new()).await.unwrap();

        assert!(require_valid(&verifier, artifact.clone()).is_ok());

        let mut tampered = artifact;
        tampered.payload[20] ^= 0x01;
        let err = require_valid(&verifier, tampered).unwrap_err();
        assert!(matches!(err, KycError::VerificationFailed(_)));
    }
}
