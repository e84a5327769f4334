//! Blocki Core
//!
//! Core domain types for the Blocki zero-knowledge KYC workflow.
//! This crate defines the claims, proof artifacts, commitments and
//! credentials shared by every stage of the pipeline.

pub mod claim;
pub mod config;
pub mod credential;
pub mod error;
pub mod issuer;
pub mod policy;
pub mod proof;

pub use claim::{ApprovedRegions, ClaimEvaluator, ClaimName, Claims, KycInput};
pub use config::KycConfig;
pub use credential::{Credential, CredentialId};
pub use error::{FailureKind, KycError};
pub use issuer::{IssuerId, SubjectId};
pub use policy::{AccessDecision, AccessPolicy};
pub use proof::{Commitment, ProofArtifact, ProofId, PublicSignals, VerificationKeyId};
