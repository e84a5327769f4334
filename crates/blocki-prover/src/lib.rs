//! Blocki Prover
//!
//! Turns evaluated claims into proof artifacts and checks them.
//! Proving sits behind the [`ProofBackend`] trait; verification is
//! standalone and needs only published verification keys.

pub mod backend;
pub mod cancel;
pub mod circuit;
pub mod prover;
pub mod verifier;
pub mod witness;

pub use backend::{
    backend_from_config, AttestedBackend, BackendError, ProofBackend, ProofResult,
};
pub use cancel::CancelToken;
pub use circuit::{Circuit, CircuitType};
pub use prover::{Prover, ProverError};
pub use verifier::{Verification, VerificationKeyRegistry, VerifiedProof, Verifier};
pub use witness::{KycWitnessBuilder, Witness};
