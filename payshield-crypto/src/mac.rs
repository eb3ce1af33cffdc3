//! HMAC-SHA256 helpers for request signing.

use crate::error::{CryptoError, CryptoResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes HMAC-SHA256 over the concatenation of `parts`.
///
/// Feeding the parts one by one is identical to hashing their
/// concatenation, without building the joined buffer.
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> CryptoResult<[u8; 32]> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(format!("HMAC-SHA256 key: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.finalize().into_bytes().into())
}

/// Lowercase hex of [`hmac_sha256`].
pub fn hmac_sha256_hex(key: &[u8], parts: &[&[u8]]) -> CryptoResult<String> {
    hmac_sha256(key, parts).map(hex::encode)
}

/// Checks `expected` against HMAC-SHA256 of `parts` in constant time.
pub fn verify_hmac_sha256(key: &[u8], parts: &[&[u8]], expected: &[u8]) -> CryptoResult<bool> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidKey(format!("HMAC-SHA256 key: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac.verify_slice(expected).is_ok())
}
