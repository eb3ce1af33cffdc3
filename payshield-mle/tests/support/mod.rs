//! Shared test helpers: credential directories built from the fixture PEMs.

#![allow(dead_code)]

use payshield_mle::{ConfigurationRegistry, ContextConfig, EncryptionEngine, ShieldConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const KEY_A: &str = include_str!("../../../fixtures/local_a_key.pem");
pub const CERT_A: &str = include_str!("../../../fixtures/local_a_cert.pem");
pub const KEY_B: &str = include_str!("../../../fixtures/local_b_key_pkcs1.pem");
pub const CERT_B: &str = include_str!("../../../fixtures/local_b_cert.pem");
pub const PUB_B: &str = include_str!("../../../fixtures/local_b_pub.pem");

/// `payshield-shared-secret`, base64.
pub const SHARED_SECRET_B64: &str = "cGF5c2hpZWxkLXNoYXJlZC1zZWNyZXQ=";

pub const FUNDS_TRANSFER_KEY_ID: &str = "ft-key-0001";
pub const AUTHORIZATION_KEY_ID: &str = "auth-key-0001";

/// Writes `contents` to `dir/name`, with mode 0600 on unix.
pub fn write_secret(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = write_file(dir, name, contents);
    set_mode(&path, 0o600);
    path
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).expect("chmod fixture");
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) {}

/// Both contexts fully configured in loopback: each context's peer
/// certificate is the certificate of its own private key, so whatever the
/// engine encrypts it can also decrypt.
///
/// - funds-transfer: PKCS#8 key A, X.509 certificate A as peer
/// - authorization: PKCS#1 key B, SPKI public key B as peer
pub fn loopback_config() -> (TempDir, ShieldConfig) {
    let dir = TempDir::new().expect("tempdir");
    let config = ShieldConfig {
        funds_transfer: ContextConfig {
            key_id: FUNDS_TRANSFER_KEY_ID.to_string(),
            private_key_path: Some(write_secret(dir.path(), "ft_key.pem", KEY_A)),
            client_cert_path: Some(write_file(dir.path(), "ft_client.pem", CERT_A)),
            peer_cert_path: Some(write_file(dir.path(), "ft_peer.pem", CERT_A)),
        },
        authorization: ContextConfig {
            key_id: AUTHORIZATION_KEY_ID.to_string(),
            private_key_path: Some(write_secret(dir.path(), "auth_key.pem", KEY_B)),
            client_cert_path: Some(write_file(dir.path(), "auth_client.pem", CERT_B)),
            peer_cert_path: Some(write_file(dir.path(), "auth_peer.pem", PUB_B)),
        },
        shared_secret: Some(SHARED_SECRET_B64.to_string()),
        ..ShieldConfig::default()
    };
    (dir, config)
}

pub fn engine_for(config: &ShieldConfig) -> Arc<EncryptionEngine> {
    let registry = Arc::new(ConfigurationRegistry::new(config));
    Arc::new(EncryptionEngine::new(registry))
}
