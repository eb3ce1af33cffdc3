//! HMAC-SHA256 request signing.
//!
//! Each outbound request carries a hex digest and the Unix timestamp it was
//! computed at. The signed message is
//! `timestamp ++ resource_path ++ query_string ++ body`, keyed with the
//! base64-decoded shared secret. Tokens are never cached: the timestamp is
//! part of the message, so every request gets a fresh one.

use crate::config::{ENV_PREFIX, ShieldConfig};
use crate::error::{ShieldError, ShieldResult};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use payshield_crypto::{hmac_sha256_hex, verify_hmac_sha256};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use zeroize::Zeroizing;

/// Header carrying the hex HMAC digest.
pub const SIGNATURE_HEADER: &str = "X-Pay-Signature";

/// Header carrying the decimal Unix timestamp used in the digest.
pub const TIMESTAMP_HEADER: &str = "X-Pay-Timestamp";

/// Signature and timestamp for one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRequestToken {
    /// Lowercase hex HMAC-SHA256 digest.
    pub signature: String,
    /// Seconds since the Unix epoch, decimal.
    pub timestamp: String,
}

impl SignedRequestToken {
    /// Header name/value pairs to attach to the request.
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            (SIGNATURE_HEADER, self.signature.as_str()),
            (TIMESTAMP_HEADER, self.timestamp.as_str()),
        ]
    }
}

/// Outcome of [`RequestSigner::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    Valid,
    /// The digest does not match the request.
    Mismatch,
    /// The digest matches but the timestamp is outside the tolerance window.
    Stale { skew_secs: u64 },
    /// Timestamp or signature could not be parsed.
    Malformed,
}

/// Signs (and verifies) requests with the shared secret.
#[derive(Clone)]
pub struct RequestSigner {
    secret: Zeroizing<Vec<u8>>,
    tolerance_secs: Option<u64>,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    /// Builds a signer from a base64 shared secret.
    ///
    /// A missing or empty secret is a configuration error.
    pub fn new(shared_secret: Option<&str>) -> ShieldResult<Self> {
        let encoded = shared_secret
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ShieldError::Configuration(format!("{ENV_PREFIX}_SHARED_SECRET is not set"))
            })?;

        let secret = BASE64.decode(encoded).map_err(|_| {
            ShieldError::Configuration("shared secret is not valid base64".to_string())
        })?;

        Ok(Self {
            secret: Zeroizing::new(secret),
            tolerance_secs: None,
        })
    }

    /// Builds a signer from the shared secret and tolerance in `config`.
    pub fn from_config(config: &ShieldConfig) -> ShieldResult<Self> {
        Ok(Self::new(config.shared_secret.as_deref())?
            .with_tolerance(config.signature_tolerance_secs))
    }

    /// Sets the clock-skew window [`verify`](Self::verify) accepts.
    pub fn with_tolerance(mut self, tolerance_secs: Option<u64>) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Signs a request at the current time.
    ///
    /// `body` must be the exact bytes sent on the wire (empty for no body).
    pub fn sign(
        &self,
        resource_path: &str,
        query_string: &str,
        body: &[u8],
    ) -> ShieldResult<SignedRequestToken> {
        self.sign_at(resource_path, query_string, body, Utc::now().timestamp())
    }

    /// Serializes `body` to JSON and signs it at the current time.
    ///
    /// Returns the serialized body so the caller sends exactly the signed
    /// bytes.
    pub fn sign_json<T>(
        &self,
        resource_path: &str,
        query_string: &str,
        body: &T,
    ) -> ShieldResult<(String, SignedRequestToken)>
    where
        T: Serialize + ?Sized,
    {
        let serialized = serde_json::to_string(body)?;
        let token = self.sign(resource_path, query_string, serialized.as_bytes())?;
        Ok((serialized, token))
    }

    /// Signs a request as of `timestamp` (Unix seconds).
    pub fn sign_at(
        &self,
        resource_path: &str,
        query_string: &str,
        body: &[u8],
        timestamp: i64,
    ) -> ShieldResult<SignedRequestToken> {
        let timestamp = timestamp.to_string();
        let signature = hmac_sha256_hex(
            &self.secret,
            &[
                timestamp.as_bytes(),
                resource_path.as_bytes(),
                query_string.as_bytes(),
                body,
            ],
        )?;

        debug!(
            resource_path,
            body_len = body.len(),
            timestamp = %timestamp,
            "signed request"
        );

        Ok(SignedRequestToken {
            signature,
            timestamp,
        })
    }

    /// Checks a token received with a request, as of `now` (Unix seconds).
    ///
    /// The digest is compared in constant time. The timestamp window is only
    /// enforced when a tolerance is configured.
    pub fn verify(
        &self,
        resource_path: &str,
        query_string: &str,
        body: &[u8],
        token: &SignedRequestToken,
        now: i64,
    ) -> SignatureCheck {
        let Ok(timestamp) = token.timestamp.trim().parse::<i64>() else {
            return SignatureCheck::Malformed;
        };
        let Ok(expected) = hex::decode(&token.signature) else {
            return SignatureCheck::Malformed;
        };

        let matches = verify_hmac_sha256(
            &self.secret,
            &[
                token.timestamp.as_bytes(),
                resource_path.as_bytes(),
                query_string.as_bytes(),
                body,
            ],
            &expected,
        );
        if !matches.unwrap_or(false) {
            return SignatureCheck::Mismatch;
        }

        if let Some(tolerance) = self.tolerance_secs {
            let skew_secs = now.abs_diff(timestamp);
            if skew_secs > tolerance {
                return SignatureCheck::Stale { skew_secs };
            }
        }

        SignatureCheck::Valid
    }
}

/// One-shot signing with an optional base64 shared secret.
pub fn sign_request(
    resource_path: &str,
    query_string: &str,
    body: &[u8],
    shared_secret: Option<&str>,
) -> ShieldResult<SignedRequestToken> {
    RequestSigner::new(shared_secret)?.sign(resource_path, query_string, body)
}
