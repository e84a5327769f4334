//! End-to-end pipeline scenarios

use std::sync::Arc;

use blocki_core::{
    AccessDecision, AccessPolicy, ApprovedRegions, ClaimEvaluator, ClaimName, FailureKind,
    KycConfig, KycError, KycInput, SubjectId,
};
use blocki_crypto::DilithiumKeypair;
use blocki_issuer::{CredentialValidator, Issuer, KycPipeline};
use blocki_ledger::{CommitmentPublisher, InMemoryLedger, RetryConfig};
use blocki_prover::{AttestedBackend, CancelToken, Prover, VerificationKeyRegistry, Verifier};
use chrono::{Duration, Utc};

struct Harness {
    pipeline: KycPipeline,
    ledger: Arc<InMemoryLedger>,
}

fn harness() -> Harness {
    let keypair = DilithiumKeypair::generate();
    let verifier = Verifier::new(VerificationKeyRegistry::with_key(keypair.public_key.clone()));
    let ledger = Arc::new(InMemoryLedger::new());

    let pipeline = KycPipeline::new(
        ClaimEvaluator::new(ApprovedRegions::default()),
        Prover::new(Arc::new(AttestedBackend::new(keypair))),
        verifier,
        CommitmentPublisher::new(ledger.clone()).with_retry(RetryConfig::fast()),
        Issuer::default(),
    );

    Harness { pipeline, ledger }
}

fn subject() -> SubjectId {
    SubjectId::new("0x71C7656EC7ab88b098defB751B7401B5f6d8976F")
}

#[tokio::test]
async fn scenario_a_adult_in_approved_region_is_granted() {
    let h = harness();
    let input = KycInput::new(25, "Argentina", true).unwrap();

    let proof = h.pipeline.prove(&input, &CancelToken::new()).await.unwrap();
    assert_eq!(
        proof.artifact().public_signals.as_slice(),
        &["true", "true", "true"]
    );

    let credential = h.pipeline.issue(&proof, &subject()).unwrap();
    assert_eq!(
        credential.expires_at() - credential.issued_at(),
        Duration::days(90)
    );

    let token = credential.to_token().unwrap();
    let validator = CredentialValidator::default().with_verifier(h.pipeline.verifier().clone());
    let presented = validator.validate_token(&token, Utc::now()).unwrap();
    assert!(validator
        .authorize(&presented, Utc::now())
        .unwrap()
        .is_granted());
}

#[tokio::test]
async fn scenario_b_minor_gets_valid_proof_but_no_access() {
    let h = harness();
    let input = KycInput::new(16, "Argentina", true).unwrap();

    let proof = h.pipeline.prove(&input, &CancelToken::new()).await.unwrap();
    assert_eq!(
        proof.artifact().public_signals.as_slice(),
        &["false", "true", "true"]
    );
    assert!(h.pipeline.verifier().is_valid(proof.artifact()));

    let credential = h.pipeline.issue(&proof, &subject()).unwrap();
    let decision = CredentialValidator::default()
        .authorize(&credential, Utc::now())
        .unwrap();
    assert_eq!(
        decision,
        AccessDecision::Denied {
            missing: vec![ClaimName::IsOver18]
        }
    );
}

#[tokio::test]
async fn scenario_c_unapproved_region_is_denied() {
    let h = harness();
    let input = KycInput::new(30, "Antarctica", false).unwrap();

    let proof = h.pipeline.prove(&input, &CancelToken::new()).await.unwrap();
    assert_eq!(
        proof.artifact().public_signals.claim(ClaimName::IsApprovedRegion),
        Some(false)
    );

    let credential = h.pipeline.issue(&proof, &subject()).unwrap();
    let decision = CredentialValidator::default()
        .authorize(&credential, Utc::now())
        .unwrap();
    assert!(!decision.is_granted());
}

#[tokio::test]
async fn region_match_ignores_case() {
    let h = harness();
    let input = KycInput::new(40, "PERÚ", false).unwrap();
    let proof = h.pipeline.prove(&input, &CancelToken::new()).await.unwrap();
    assert_eq!(
        proof.artifact().public_signals.claim(ClaimName::IsApprovedRegion),
        Some(true)
    );
}

#[tokio::test]
async fn tampered_artifact_cannot_be_issued() {
    let h = harness();
    let input = KycInput::new(16, "Chile", false).unwrap();
    let proof = h.pipeline.prove(&input, &CancelToken::new()).await.unwrap();

    let mut forged = proof.artifact().clone();
    forged.public_signals = blocki_core::PublicSignals::from_values([true, true, true]);
    assert!(!h.pipeline.verifier().is_valid(&forged));

    let err = h
        .pipeline
        .issuer()
        .issue_artifact(h.pipeline.verifier(), forged, &subject())
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Restart);

    let mut corrupted = proof.into_artifact();
    let last = corrupted.payload.len() - 1;
    corrupted.payload[last] ^= 0x80;
    assert!(!h.pipeline.verifier().is_valid(&corrupted));
}

#[tokio::test]
async fn publish_then_resubmit() {
    let h = harness();
    let input = KycInput::new(25, "Uruguay", true).unwrap();
    let proof = h.pipeline.prove(&input, &CancelToken::new()).await.unwrap();

    let first = h.pipeline.publish(&proof, &subject()).await.unwrap();
    assert_eq!(first.commitment, proof.commitment());
    assert!(h.ledger.contains(&proof.commitment()));

    let again = h.pipeline.publish(&proof, &subject()).await.unwrap();
    assert_eq!(first.transaction, again.transaction);
    assert_eq!(h.ledger.len(), 1);

    let entry = &h.ledger.entries()[0];
    assert_eq!(entry.record.subject, subject());
}

#[tokio::test]
async fn credential_expires_after_window() {
    let h = harness();
    let input = KycInput::new(25, "Brasil", true).unwrap();
    let proof = h.pipeline.prove(&input, &CancelToken::new()).await.unwrap();
    let credential = h.pipeline.issue(&proof, &subject()).unwrap();

    let validator = CredentialValidator::new(AccessPolicy::default());
    let later = credential.issued_at() + Duration::days(91);
    let err = validator.authorize(&credential, later).unwrap_err();
    assert!(matches!(err, KycError::ExpiredCredential { .. }));
    assert_eq!(err.kind(), FailureKind::Expired);
}

#[tokio::test]
async fn cancelled_proving_is_retriable() {
    let h = harness();
    let input = KycInput::new(25, "Argentina", true).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = h.pipeline.prove(&input, &cancel).await.unwrap_err();
    assert!(matches!(err, KycError::ProofGeneration(_)));
    assert!(err.is_retriable());
}

#[test]
fn malformed_input_fails_fast() {
    for (age, region) in [("abc", "Argentina"), ("-1", "Argentina"), ("20", "   ")] {
        let err = KycInput::parse(age, region, false).unwrap_err();
        assert_eq!(err.kind(), FailureKind::CheckInput, "{} / {:?}", age, region);
    }
}

#[tokio::test]
async fn pipeline_from_default_config() {
    let pipeline = KycPipeline::from_config(&KycConfig::default(), DilithiumKeypair::generate())
        .unwrap();
    assert_eq!(pipeline.publisher().ledger_name(), "memory");

    let input = KycInput::new(18, "México", false).unwrap();
    let proof = pipeline.prove(&input, &CancelToken::new()).await.unwrap();
    assert_eq!(proof.artifact().public_signals.claim(ClaimName::IsOver18), Some(true));
}
