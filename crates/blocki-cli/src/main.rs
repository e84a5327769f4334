//! Blocki CLI
//!
//! Command-line driver for the zero-knowledge KYC workflow.

use std::path::PathBuf;

use anyhow::Result;
use blocki_core::KycError;
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "blocki")]
#[command(author, version, about = "Blocki: zero-knowledge KYC credentials", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./blocki.toml when present)
    #[arg(short, long, global = true, env = "BLOCKI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the prover's attestation key
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Prove, verify and publish KYC claims
    Kyc {
        #[command(subcommand)]
        action: KycAction,
    },

    /// Issue and check credentials
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Show configuration and status
    Status,
}

#[derive(Subcommand)]
enum KeysAction {
    /// Create the attestation key pair, or unlock the existing one
    Init {
        /// Key directory (overrides prover.key_dir)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum KycAction {
    /// Evaluate claims and generate a proof
    Prove {
        /// Age in whole years
        #[arg(short, long)]
        age: String,

        /// Region of residence
        #[arg(short, long)]
        region: String,

        /// Subject was verified before
        #[arg(long)]
        prior_verified: bool,

        /// Output proof file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Verify a proof file
    Verify {
        /// Proof file
        proof: PathBuf,
    },

    /// Verify a proof and publish its commitment
    Publish {
        /// Proof file
        proof: PathBuf,

        /// Subject public identifier
        #[arg(short, long, env = "BLOCKI_SUBJECT")]
        subject: Option<String>,
    },
}

#[derive(Subcommand)]
enum CredentialAction {
    /// Verify a proof and issue a credential
    Issue {
        /// Proof file
        proof: PathBuf,

        /// Subject public identifier
        #[arg(short, long, env = "BLOCKI_SUBJECT")]
        subject: Option<String>,

        /// Write the credential token to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a credential token for expiry and access
    Check {
        /// Token file
        token: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("blocki={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", style("✗").red().bold(), style(&err).red());
        if let Some(kyc) = err.downcast_ref::<KycError>() {
            eprintln!("  {}", style(kyc.kind().guidance()).yellow());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Keys { action } => match action {
            KeysAction::Init { dir } => commands::keys::init(config, dir).await?,
        },
        Commands::Kyc { action } => match action {
            KycAction::Prove {
                age,
                region,
                prior_verified,
                output,
            } => {
                commands::kyc::prove(config, &age, &region, prior_verified, &output).await?;
            }
            KycAction::Verify { proof } => commands::kyc::verify(config, &proof).await?,
            KycAction::Publish { proof, subject } => {
                commands::kyc::publish(config, &proof, subject).await?;
            }
        },
        Commands::Credential { action } => match action {
            CredentialAction::Issue {
                proof,
                subject,
                output,
            } => {
                commands::credential::issue(config, &proof, subject, output.as_deref()).await?;
            }
            CredentialAction::Check { token } => {
                commands::credential::check(config, &token).await?;
            }
        },
        Commands::Status => commands::status::show(config).await?,
    }

    Ok(())
}
