//! Blocki Issuer
//!
//! Credential issuance, consumer-side validation and the pipeline that
//! wires evaluation, proving, verification, publishing and issuance.

pub mod issuer;
pub mod pipeline;
pub mod validator;

pub use issuer::Issuer;
pub use pipeline::KycPipeline;
pub use validator::CredentialValidator;
