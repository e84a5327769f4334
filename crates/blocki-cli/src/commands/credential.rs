//! Credential issuance and checking commands

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use blocki_core::{AccessDecision, ClaimName};
use blocki_issuer::{CredentialValidator, Issuer};
use chrono::Utc;
use console::style;

use super::{load_config, read_artifact, subject, verifier};

/// Verify a proof file and issue a credential for the subject
pub async fn issue(
    config: Option<&Path>,
    proof_file: &Path,
    identifier: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let subject = subject(identifier).await?;
    let artifact = read_artifact(proof_file)?;

    let issuer = Issuer::from_config(&config)?;
    let credential = issuer.issue_artifact(&verifier(&config)?, artifact, &subject)?;
    let token = credential.to_token()?;

    match output {
        Some(path) => {
            fs::write(path, &token)?;
            println!("\n{}", style("✓ Credential issued").green().bold());
            println!();
            println!("  Credential id: {}", style(credential.id()).cyan());
            println!("  Issuer:        {}", credential.issuer());
            println!("  Subject:       {}", style(subject.short()).cyan());
            println!("  Expires:       {}", credential.expires_at().to_rfc3339());
            println!("  Token file:    {}", style(path.display()).yellow());
        }
        // Token alone on stdout so it can be piped
        None => println!("{}", token),
    }

    Ok(())
}

/// Check a credential token for expiry and the configured access policy
pub async fn check(config: Option<&Path>, token_file: &Path) -> Result<()> {
    println!("\n{}", style("Checking Credential").bold().underlined());
    println!();

    let config = load_config(config)?;
    let token = fs::read_to_string(token_file)
        .with_context(|| format!("reading token file {}", token_file.display()))?;

    let now = Utc::now();
    let validator = CredentialValidator::new(config.access_policy()).with_verifier(verifier(&config)?);
    let credential = validator.validate_token(token.trim(), now)?;

    println!("  Credential id: {}", style(credential.id()).cyan());
    println!("  Subject:       {}", style(credential.subject().short()).cyan());
    println!("  Issued:        {}", credential.issued_at().to_rfc3339());
    println!("  Expires:       {}", credential.expires_at().to_rfc3339());
    println!();

    println!("{}", style("Claims:").bold());
    for name in ClaimName::ALL {
        let value = match credential.claim(name) {
            Some(true) => style("true").green(),
            Some(false) => style("false").red(),
            None => style("?").dim(),
        };
        println!("  {:<18} {}", name.as_str(), value);
    }
    println!();

    match validator.authorize(&credential, now)? {
        AccessDecision::Granted => {
            println!("{}", style("✓ Access GRANTED").green().bold());
        }
        AccessDecision::Denied { missing } => {
            println!("{}", style("✗ Access DENIED").red().bold());
            let missing: Vec<&str> = missing.iter().map(ClaimName::as_str).collect();
            println!("  Missing claims: {}", style(missing.join(", ")).red());
        }
    }

    Ok(())
}
