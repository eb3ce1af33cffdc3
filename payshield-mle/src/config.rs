//! Payload-protection configuration.
//!
//! Read once at process start-up and handed to component constructors.
//! Nothing in this crate reads the environment after that.

use crate::context::ContextId;
use crate::error::{ShieldError, ShieldResult};
use crate::policy::ProtectionPolicy;
use payshield_crypto::VaultKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Prefix for every environment variable this crate reads.
pub const ENV_PREFIX: &str = "PAYSHIELD";

/// Key id and credential paths for one integration context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Key identifier assigned by the counterparty.
    #[serde(default)]
    pub key_id: String,

    /// PEM private key used to decrypt inbound payloads.
    pub private_key_path: Option<PathBuf>,

    /// PEM client certificate presented on the transport.
    pub client_cert_path: Option<PathBuf>,

    /// PEM certificate (or public key) of the counterparty.
    pub peer_cert_path: Option<PathBuf>,
}

/// Configuration for the payload-protection subsystem.
///
/// `Debug` redacts the shared secret and vault key.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldConfig {
    #[serde(default)]
    pub funds_transfer: ContextConfig,

    #[serde(default)]
    pub authorization: ContextConfig,

    /// Base64-encoded HMAC secret for request signing.
    pub shared_secret: Option<String>,

    /// At-rest vault key (64 hex chars or base64 of 32 bytes).
    pub vault_key: Option<String>,

    /// What `protect` does when it cannot encrypt.
    #[serde(default)]
    pub protection_policy: ProtectionPolicy,

    /// Maximum clock skew accepted when verifying signed requests.
    /// `None` disables the freshness check.
    pub signature_tolerance_secs: Option<u64>,
}

impl fmt::Debug for ShieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ShieldConfig")
            .field("funds_transfer", &self.funds_transfer)
            .field("authorization", &self.authorization)
            .field("shared_secret", &redact(&self.shared_secret))
            .field("vault_key", &redact(&self.vault_key))
            .field("protection_policy", &self.protection_policy)
            .field("signature_tolerance_secs", &self.signature_tolerance_secs)
            .finish()
    }
}

impl ShieldConfig {
    pub fn context(&self, id: ContextId) -> &ContextConfig {
        match id {
            ContextId::FundsTransfer => &self.funds_transfer,
            ContextId::Authorization => &self.authorization,
        }
    }

    pub fn context_mut(&mut self, id: ContextId) -> &mut ContextConfig {
        match id {
            ContextId::FundsTransfer => &mut self.funds_transfer,
            ContextId::Authorization => &mut self.authorization,
        }
    }

    /// Loads configuration from the process environment.
    pub fn from_env() -> ShieldResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    ///
    /// Variables: `PAYSHIELD_<CTX>_KEY_ID`, `PAYSHIELD_<CTX>_PRIVATE_KEY`,
    /// `PAYSHIELD_<CTX>_CLIENT_CERT`, `PAYSHIELD_<CTX>_PEER_CERT` for each
    /// context, then `PAYSHIELD_SHARED_SECRET`, `PAYSHIELD_VAULT_KEY`,
    /// `PAYSHIELD_PROTECTION_POLICY` and `PAYSHIELD_SIGNATURE_TOLERANCE_SECS`.
    pub fn from_lookup<F>(lookup: F) -> ShieldResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mut config = ShieldConfig::default();
        for id in ContextId::ALL {
            let var = |suffix: &str| format!("{ENV_PREFIX}_{}_{suffix}", id.env_token());
            *config.context_mut(id) = ContextConfig {
                key_id: get(&var("KEY_ID")).unwrap_or_default(),
                private_key_path: get(&var("PRIVATE_KEY")).map(PathBuf::from),
                client_cert_path: get(&var("CLIENT_CERT")).map(PathBuf::from),
                peer_cert_path: get(&var("PEER_CERT")).map(PathBuf::from),
            };
        }

        config.shared_secret = get(&format!("{ENV_PREFIX}_SHARED_SECRET"));
        config.vault_key = get(&format!("{ENV_PREFIX}_VAULT_KEY"));

        if let Some(policy) = get(&format!("{ENV_PREFIX}_PROTECTION_POLICY")) {
            config.protection_policy = policy.parse()?;
        }

        if let Some(secs) = get(&format!("{ENV_PREFIX}_SIGNATURE_TOLERANCE_SECS")) {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                ShieldError::Configuration(format!(
                    "{ENV_PREFIX}_SIGNATURE_TOLERANCE_SECS must be a whole number of seconds"
                ))
            })?;
            config.signature_tolerance_secs = Some(secs);
        }

        Ok(config)
    }

    /// Parses the configured vault key.
    pub fn load_vault_key(&self) -> ShieldResult<VaultKey> {
        let encoded = self.vault_key.as_deref().ok_or_else(|| {
            ShieldError::Configuration(format!("{ENV_PREFIX}_VAULT_KEY is not set"))
        })?;
        VaultKey::parse(encoded)
            .map_err(|e| ShieldError::Configuration(format!("vault key rejected: {e}")))
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> ShieldResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| ShieldError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
