mod support;

use payshield_mle::signer::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use payshield_mle::{RequestSigner, ShieldConfig, ShieldError, SignatureCheck, sign_request};
use proptest::prelude::*;
use serde_json::json;
use support::SHARED_SECRET_B64;

const PATH: &str = "/visadirect/fundstransfer/v1/pushfundstransactions";
const QUERY: &str = "apikey=abc";
const BODY: &[u8] = br#"{"amount":"100.00"}"#;
const TS: i64 = 1_700_000_000;

fn signer() -> RequestSigner {
    RequestSigner::new(Some(SHARED_SECRET_B64)).unwrap()
}

// ── Signing ──

#[test]
fn known_answer() {
    let token = signer().sign_at(PATH, QUERY, BODY, TS).unwrap();
    assert_eq!(token.timestamp, "1700000000");
    assert_eq!(
        token.signature,
        "ebd88be0482123350d594590114690d5fe2a5266cf5fa51eb88c4bcd0582d00e"
    );
}

#[test]
fn deterministic_for_fixed_inputs() {
    let a = signer().sign_at(PATH, QUERY, BODY, TS).unwrap();
    let b = signer().sign_at(PATH, QUERY, BODY, TS).unwrap();
    assert_eq!(a, b);
}

#[test]
fn every_input_changes_the_signature() {
    let base = signer().sign_at(PATH, QUERY, BODY, TS).unwrap().signature;

    let variants = [
        signer().sign_at("/other", QUERY, BODY, TS).unwrap(),
        signer().sign_at(PATH, "apikey=abd", BODY, TS).unwrap(),
        signer().sign_at(PATH, QUERY, br#"{"amount":"100.01"}"#, TS).unwrap(),
        signer().sign_at(PATH, QUERY, BODY, TS + 1).unwrap(),
        RequestSigner::new(Some("b3RoZXItc2VjcmV0"))
            .unwrap()
            .sign_at(PATH, QUERY, BODY, TS)
            .unwrap(),
    ];

    for token in variants {
        assert_ne!(token.signature, base);
    }
}

#[test]
fn sign_uses_current_time() {
    let before = chrono::Utc::now().timestamp();
    let token = signer().sign(PATH, QUERY, BODY).unwrap();
    let after = chrono::Utc::now().timestamp();

    let ts: i64 = token.timestamp.parse().unwrap();
    assert!(ts >= before && ts <= after);
    assert_eq!(token.signature.len(), 64);
}

#[test]
fn sign_json_returns_the_signed_bytes() {
    let (body, token) = signer()
        .sign_json(PATH, QUERY, &json!({ "amount": "100.00" }))
        .unwrap();
    assert_eq!(body.as_bytes(), BODY);

    let expected = signer()
        .sign_at(PATH, QUERY, body.as_bytes(), token.timestamp.parse().unwrap())
        .unwrap();
    assert_eq!(token, expected);
}

#[test]
fn headers_carry_signature_and_timestamp() {
    let token = signer().sign_at(PATH, QUERY, BODY, TS).unwrap();
    let headers = token.headers();
    assert_eq!(headers[0], (SIGNATURE_HEADER, token.signature.as_str()));
    assert_eq!(headers[1], (TIMESTAMP_HEADER, "1700000000"));
}

// ── Configuration ──

#[test]
fn missing_secret_is_configuration_error() {
    assert!(matches!(RequestSigner::new(None), Err(ShieldError::Configuration(_))));
    assert!(matches!(RequestSigner::new(Some("  ")), Err(ShieldError::Configuration(_))));
    assert!(matches!(
        sign_request(PATH, QUERY, BODY, None),
        Err(ShieldError::Configuration(_))
    ));
}

#[test]
fn non_base64_secret_is_configuration_error() {
    let err = RequestSigner::new(Some("not base64!")).unwrap_err();
    assert!(matches!(err, ShieldError::Configuration(_)));
    assert!(!err.to_string().contains("not base64!"));
}

#[test]
fn from_config_reads_secret_and_tolerance() {
    let config = ShieldConfig {
        shared_secret: Some(SHARED_SECRET_B64.to_string()),
        signature_tolerance_secs: Some(30),
        ..ShieldConfig::default()
    };
    let signer = RequestSigner::from_config(&config).unwrap();
    let token = signer.sign_at(PATH, QUERY, BODY, TS).unwrap();
    assert_eq!(
        signer.verify(PATH, QUERY, BODY, &token, TS + 31),
        SignatureCheck::Stale { skew_secs: 31 }
    );

    assert!(RequestSigner::from_config(&ShieldConfig::default()).is_err());
}

#[test]
fn debug_hides_secret() {
    let rendered = format!("{:?}", signer());
    assert!(!rendered.contains(SHARED_SECRET_B64));
    assert!(!rendered.contains("payshield-shared-secret"));
}

// ── Verification ──

#[test]
fn verify_accepts_own_token() {
    let signer = signer();
    let token = signer.sign_at(PATH, QUERY, BODY, TS).unwrap();
    assert_eq!(signer.verify(PATH, QUERY, BODY, &token, TS), SignatureCheck::Valid);
    // Without a tolerance window, age is not checked.
    assert_eq!(
        signer.verify(PATH, QUERY, BODY, &token, TS + 86_400),
        SignatureCheck::Valid
    );
}

#[test]
fn verify_rejects_tampered_request() {
    let signer = signer();
    let token = signer.sign_at(PATH, QUERY, BODY, TS).unwrap();
    assert_eq!(
        signer.verify(PATH, QUERY, br#"{"amount":"999.00"}"#, &token, TS),
        SignatureCheck::Mismatch
    );

    let mut shifted = token.clone();
    shifted.timestamp = (TS + 1).to_string();
    assert_eq!(signer.verify(PATH, QUERY, BODY, &shifted, TS), SignatureCheck::Mismatch);
}

#[test]
fn verify_flags_malformed_tokens() {
    let signer = signer();
    let mut token = signer.sign_at(PATH, QUERY, BODY, TS).unwrap();
    token.signature = "zz".to_string();
    assert_eq!(signer.verify(PATH, QUERY, BODY, &token, TS), SignatureCheck::Malformed);

    let mut token = signer.sign_at(PATH, QUERY, BODY, TS).unwrap();
    token.timestamp = "yesterday".to_string();
    assert_eq!(signer.verify(PATH, QUERY, BODY, &token, TS), SignatureCheck::Malformed);
}

#[test]
fn tolerance_window_is_symmetric() {
    let signer = signer().with_tolerance(Some(60));
    let token = signer.sign_at(PATH, QUERY, BODY, TS).unwrap();

    assert_eq!(signer.verify(PATH, QUERY, BODY, &token, TS + 60), SignatureCheck::Valid);
    assert_eq!(signer.verify(PATH, QUERY, BODY, &token, TS - 60), SignatureCheck::Valid);
    assert_eq!(
        signer.verify(PATH, QUERY, BODY, &token, TS - 61),
        SignatureCheck::Stale { skew_secs: 61 }
    );
}

proptest! {
    #[test]
    fn sign_then_verify(
        path in "/[a-z/]{0,40}",
        query in "[a-z=&]{0,30}",
        body in proptest::collection::vec(any::<u8>(), 0..200),
        ts in 0i64..4_000_000_000,
    ) {
        let signer = signer();
        let token = signer.sign_at(&path, &query, &body, ts).unwrap();
        prop_assert_eq!(signer.verify(&path, &query, &body, &token, ts), SignatureCheck::Valid);
        prop_assert_eq!(token.clone(), signer.sign_at(&path, &query, &body, ts).unwrap());
    }
}
