//! Error types for cryptographic primitives.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by the primitives.
///
/// Messages carry lengths, labels and algorithm names only. Key bytes,
/// plaintext and ciphertext never end up in an error.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("plaintext too large for key: {len} bytes exceeds limit of {max}")]
    PlaintextTooLarge { len: usize, max: usize },

    #[error("malformed ciphertext record: {0}")]
    Format(String),
}
