use payshield_crypto::CryptoError;
use payshield_mle::ShieldError;
use std::error::Error as _;

#[test]
fn unknown_context_display() {
    let err = ShieldError::UnknownContext("contextC".into());
    assert_eq!(err.to_string(), "unknown integration context: contextC");
}

#[test]
fn configuration_display() {
    let err = ShieldError::Configuration("shared secret is not set".into());
    assert_eq!(err.to_string(), "invalid configuration: shared secret is not set");
}

#[test]
fn crypto_display_wraps_inner_error() {
    let err = ShieldError::Crypto(CryptoError::Decryption("OAEP unpadding failed".into()));
    assert_eq!(err.to_string(), "crypto error: decryption failed: OAEP unpadding failed");
}

#[test]
fn format_display() {
    let err = ShieldError::Format("missing ':' separator".into());
    assert_eq!(err.to_string(), "malformed record: missing ':' separator");
}

#[test]
fn io_display_names_the_path() {
    let err = ShieldError::Io {
        path: "/etc/payshield/key.pem".into(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
    };
    assert_eq!(
        err.to_string(),
        "I/O error reading /etc/payshield/key.pem: no such file"
    );
    assert!(err.source().is_some());
}

#[test]
fn crypto_errors_map_to_crypto_variant() {
    let err: ShieldError = CryptoError::PlaintextTooLarge { len: 300, max: 190 }.into();
    assert!(matches!(
        err,
        ShieldError::Crypto(CryptoError::PlaintextTooLarge { len: 300, max: 190 })
    ));

    let err: ShieldError = CryptoError::InvalidKeyLength { expected: 32, actual: 16 }.into();
    assert!(matches!(err, ShieldError::Crypto(_)));
}

#[test]
fn crypto_format_maps_to_format_variant() {
    let err: ShieldError = CryptoError::Format("bad iv".into()).into();
    match err {
        ShieldError::Format(msg) => assert_eq!(msg, "bad iv"),
        other => panic!("expected Format, got: {other:?}"),
    }
}

#[test]
fn serde_errors_convert() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: ShieldError = json_err.into();
    assert!(matches!(err, ShieldError::Serialization(_)));
    assert!(err.to_string().starts_with("serialization error:"));
}
