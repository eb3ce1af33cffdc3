//! Payload-protection error types.

use payshield_crypto::CryptoError;
use thiserror::Error;

/// Result type for payload-protection operations.
pub type ShieldResult<T> = Result<T, ShieldError>;

/// Errors that can occur while protecting, revealing or signing payloads.
///
/// `UnknownContext` and `Configuration` point at a deployment defect and are
/// always returned to the caller. `Crypto` is never transient; nothing in
/// this crate retries it.
#[derive(Debug, Error)]
pub enum ShieldError {
    #[error("unknown integration context: {0}")]
    UnknownContext(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("malformed record: {0}")]
    Format(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<CryptoError> for ShieldError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Format(msg) => ShieldError::Format(msg),
            other => ShieldError::Crypto(other),
        }
    }
}
