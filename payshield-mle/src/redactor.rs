//! Field-level protection of structured payloads.
//!
//! `protect` pulls the named sensitive fields out of an outbound payload,
//! seals them as one envelope and puts the envelope fields in their place.
//! `reveal` reverses that on inbound payloads.

use crate::context::ContextId;
use crate::engine::{DecryptedPayload, EncryptionEngine};
use crate::envelope::{ENCRYPTED_DATA_FIELD, EncryptedEnvelope};
use crate::error::{ShieldError, ShieldResult};
use crate::policy::ProtectionPolicy;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Moves sensitive fields in and out of encrypted envelopes.
pub struct FieldRedactor {
    engine: Arc<EncryptionEngine>,
    policy: ProtectionPolicy,
}

impl FieldRedactor {
    pub fn new(engine: Arc<EncryptionEngine>, policy: ProtectionPolicy) -> Self {
        Self { engine, policy }
    }

    pub fn policy(&self) -> ProtectionPolicy {
        self.policy
    }

    pub fn engine(&self) -> &EncryptionEngine {
        &self.engine
    }

    /// Replaces every field of `field_names` present in `payload` with an
    /// encrypted envelope for `ctx`.
    ///
    /// If none of the fields are present the payload comes back untouched,
    /// with no envelope fields added. If the context is unconfigured or
    /// encryption fails, the outcome depends on the policy: `FailOpen`
    /// returns the payload with the fields still in the clear, `FailClosed`
    /// returns the error.
    pub fn protect(
        &self,
        mut payload: Map<String, Value>,
        field_names: &[&str],
        ctx: ContextId,
    ) -> ShieldResult<Map<String, Value>> {
        let mut extract = Map::new();
        for name in field_names {
            if let Some(value) = payload.get(*name) {
                extract.insert((*name).to_string(), value.clone());
            }
        }

        if extract.is_empty() {
            return Ok(payload);
        }

        let envelope = match self.engine.encrypt(&extract, ctx) {
            Ok(envelope) => envelope,
            Err(e) if is_policy_governed(&e) => {
                return match self.policy {
                    ProtectionPolicy::FailOpen => {
                        warn!(
                            context = %ctx,
                            fields = extract.len(),
                            error = %e,
                            "sending sensitive fields unprotected (fail-open policy)"
                        );
                        Ok(payload)
                    }
                    ProtectionPolicy::FailClosed => {
                        error!(context = %ctx, fields = extract.len(), error = %e, "refusing to send unprotected payload");
                        Err(e)
                    }
                };
            }
            Err(e) => return Err(e),
        };

        for name in extract.keys() {
            payload.remove(name);
        }
        envelope.merge_into(&mut payload);

        debug!(context = %ctx, fields = extract.len(), "protected payload fields");
        Ok(payload)
    }

    /// Opens the envelope in `payload`, if any, and merges the decrypted
    /// fields back in.
    ///
    /// A payload without `encryptedData` is returned unchanged. If the
    /// envelope cannot be decrypted, the private key cannot be read, or the
    /// plaintext is not an object, the original still-encrypted payload is
    /// returned and the failure is logged. Configuration problems are
    /// returned as errors.
    pub fn reveal(
        &self,
        mut payload: Map<String, Value>,
        ctx: ContextId,
    ) -> ShieldResult<Map<String, Value>> {
        let Some(envelope) = EncryptedEnvelope::extract(&payload) else {
            if payload.contains_key(ENCRYPTED_DATA_FIELD) {
                warn!(context = %ctx, "encryptedData is not a string, leaving payload as is");
            }
            return Ok(payload);
        };

        let fields = match self.engine.decrypt_envelope(&envelope, ctx) {
            Ok(DecryptedPayload::Structured(Value::Object(fields))) => fields,
            Ok(_) => {
                error!(context = %ctx, "decrypted envelope is not an object, leaving payload encrypted");
                return Ok(payload);
            }
            Err(e @ (ShieldError::Crypto(_) | ShieldError::Io { .. })) => {
                error!(context = %ctx, error = %e, "envelope decryption failed, leaving payload encrypted");
                return Ok(payload);
            }
            Err(e) => return Err(e),
        };

        EncryptedEnvelope::strip_from(&mut payload);
        debug!(context = %ctx, fields = fields.len(), "revealed payload fields");
        payload.extend(fields);
        Ok(payload)
    }
}

/// Errors the protection policy decides on; anything else is a bug in the
/// caller or the payload and is always returned.
fn is_policy_governed(err: &ShieldError) -> bool {
    matches!(
        err,
        ShieldError::Configuration(_) | ShieldError::Crypto(_) | ShieldError::Io { .. }
    )
}
