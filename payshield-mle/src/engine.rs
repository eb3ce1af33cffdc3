//! RSA-OAEP message-level encryption scoped to an integration context.
//!
//! Encryption always targets the counterparty's certificate and decryption
//! always uses this process's private key; the engine has no way to reach
//! the local client certificate. Parsed keys are memoized per context on
//! first use and held for the life of the engine.

use crate::context::{ContextId, IntegrationContext};
use crate::envelope::EncryptedEnvelope;
use crate::error::{ShieldError, ShieldResult};
use crate::registry::ConfigurationRegistry;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use payshield_crypto::{CryptoError, LocalPrivateKey, PeerPublicKey, oaep_decrypt, oaep_encrypt};
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Result of [`EncryptionEngine::decrypt`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecryptedPayload {
    /// The plaintext parsed as JSON.
    Structured(Value),
    /// The plaintext as text, either by request or because it was not JSON.
    Raw(String),
}

impl DecryptedPayload {
    pub fn into_value(self) -> Value {
        match self {
            DecryptedPayload::Structured(value) => value,
            DecryptedPayload::Raw(text) => Value::String(text),
        }
    }
}

/// Asymmetric field encryption for every integration context.
pub struct EncryptionEngine {
    registry: Arc<ConfigurationRegistry>,
    peer_keys: [OnceLock<PeerPublicKey>; 2],
    local_keys: [OnceLock<LocalPrivateKey>; 2],
}

impl EncryptionEngine {
    pub fn new(registry: Arc<ConfigurationRegistry>) -> Self {
        Self {
            registry,
            peer_keys: [OnceLock::new(), OnceLock::new()],
            local_keys: [OnceLock::new(), OnceLock::new()],
        }
    }

    pub fn registry(&self) -> &ConfigurationRegistry {
        &self.registry
    }

    /// Loads and caches both keys of every configured context.
    ///
    /// Call at start-up to surface bad key material before the first request.
    /// Unconfigured contexts are skipped.
    pub fn preload(&self) -> ShieldResult<()> {
        for ctx in ContextId::ALL {
            if self.registry.is_configured(ctx) {
                self.peer_key(ctx)?;
                self.local_key(ctx)?;
            }
        }
        Ok(())
    }

    /// Largest serialized extract `encrypt` accepts for `ctx`.
    pub fn max_plaintext_len(&self, ctx: ContextId) -> ShieldResult<usize> {
        self.ensure_configured(ctx)?;
        Ok(self.peer_key(ctx)?.max_plaintext_len())
    }

    /// Serializes `data` to JSON and seals it to the counterparty of `ctx`.
    pub fn encrypt<T>(&self, data: &T, ctx: ContextId) -> ShieldResult<EncryptedEnvelope>
    where
        T: Serialize + ?Sized,
    {
        let context = self.ensure_configured(ctx)?;
        let peer = self.peer_key(ctx)?;
        let started = Instant::now();

        let plaintext = Zeroizing::new(serde_json::to_vec(data)?);
        let ciphertext = oaep_encrypt(peer, &plaintext).inspect_err(|e| {
            warn!(context = %ctx, plaintext_len = plaintext.len(), error = %e, "payload encryption failed");
        })?;

        debug!(
            context = %ctx,
            key_id = %context.key_id(),
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "encrypted payload extract"
        );

        Ok(EncryptedEnvelope::new(
            BASE64.encode(&ciphertext),
            context.key_id().to_string(),
        ))
    }

    /// Opens a base64 ciphertext with the local private key of `ctx`.
    ///
    /// With `parse_as_structured`, the plaintext is parsed as JSON; if that
    /// fails the raw text is returned instead of an error. Invalid UTF-8 is
    /// replaced with U+FFFD in the raw text.
    pub fn decrypt(
        &self,
        ciphertext_b64: &str,
        ctx: ContextId,
        parse_as_structured: bool,
    ) -> ShieldResult<DecryptedPayload> {
        self.ensure_configured(ctx)?;
        let local = self.local_key(ctx)?;
        let started = Instant::now();

        let ciphertext = BASE64.decode(ciphertext_b64.trim()).map_err(|_| {
            ShieldError::Crypto(CryptoError::Decryption(
                "ciphertext is not valid base64".to_string(),
            ))
        })?;
        let plaintext = Zeroizing::new(oaep_decrypt(local, &ciphertext).inspect_err(|e| {
            warn!(context = %ctx, ciphertext_len = ciphertext.len(), error = %e, "payload decryption failed");
        })?);

        debug!(
            context = %ctx,
            ciphertext_len = ciphertext.len(),
            plaintext_len = plaintext.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "decrypted payload extract"
        );

        if parse_as_structured {
            match serde_json::from_slice::<Value>(&plaintext) {
                Ok(value) => return Ok(DecryptedPayload::Structured(value)),
                Err(_) => debug!(context = %ctx, "decrypted payload is not JSON, returning raw text"),
            }
        }

        let text = match String::from_utf8_lossy(&plaintext) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => {
                debug!(context = %ctx, "decrypted payload is not UTF-8, replacing invalid sequences");
                text
            }
        };
        Ok(DecryptedPayload::Raw(text))
    }

    /// Opens an envelope as structured data.
    ///
    /// A key id that differs from the configured one is logged (the
    /// counterparty may be rotating keys) and decryption is still attempted.
    pub fn decrypt_envelope(
        &self,
        envelope: &EncryptedEnvelope,
        ctx: ContextId,
    ) -> ShieldResult<DecryptedPayload> {
        let context = self.ensure_configured(ctx)?;
        if !envelope.encryption_key_id.is_empty() && envelope.encryption_key_id != context.key_id() {
            warn!(
                context = %ctx,
                expected_key_id = %context.key_id(),
                envelope_key_id = %envelope.encryption_key_id,
                "envelope key id does not match configured key id"
            );
        }
        if !envelope.encryption_type.is_empty() && !envelope.is_oaep_sha256() {
            warn!(context = %ctx, encryption_type = %envelope.encryption_type, "unexpected envelope encryption type");
        }
        self.decrypt(&envelope.encrypted_data, ctx, true)
    }

    fn ensure_configured(&self, ctx: ContextId) -> ShieldResult<&IntegrationContext> {
        let context = self.registry.context(ctx);
        if context.is_configured() {
            Ok(context)
        } else {
            Err(ShieldError::Configuration(format!(
                "integration context {ctx} is not configured"
            )))
        }
    }

    fn peer_key(&self, ctx: ContextId) -> ShieldResult<&PeerPublicKey> {
        let cell = &self.peer_keys[ctx.index()];
        if let Some(key) = cell.get() {
            return Ok(key);
        }
        let loaded = self.registry.read_peer_public_key(ctx)?;
        debug!(context = %ctx, modulus_bytes = loaded.modulus_bytes(), "loaded peer public key");
        Ok(cell.get_or_init(|| loaded))
    }

    fn local_key(&self, ctx: ContextId) -> ShieldResult<&LocalPrivateKey> {
        let cell = &self.local_keys[ctx.index()];
        if let Some(key) = cell.get() {
            return Ok(key);
        }
        let loaded = self.registry.read_private_key(ctx)?;
        debug!(context = %ctx, modulus_bytes = loaded.modulus_bytes(), "loaded local private key");
        Ok(cell.get_or_init(|| loaded))
    }
}
