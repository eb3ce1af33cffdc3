//! Payload protection for card-network integrations.
//!
//! Provides the pieces a request pipeline needs around the wire:
//! - Per-context credential configuration with on-disk diagnostics
//! - RSA-OAEP message-level encryption of selected payload fields
//! - Envelope protect/reveal with an explicit fail-open/fail-closed policy
//! - HMAC-SHA256 request signing and verification
//! - AES-256-CBC vault records for stored card numbers (re-exported from
//!   `payshield-crypto`)
//!
//! Everything is built from one [`ShieldConfig`] at start-up:
//!
//! ```no_run
//! use payshield_mle::{ConfigurationRegistry, EncryptionEngine, FieldRedactor, ShieldConfig};
//! use std::sync::Arc;
//!
//! let config = ShieldConfig::from_env()?;
//! let registry = Arc::new(ConfigurationRegistry::new(&config));
//! let engine = Arc::new(EncryptionEngine::new(registry));
//! engine.preload()?;
//! let redactor = FieldRedactor::new(engine, config.protection_policy);
//! # Ok::<(), payshield_mle::ShieldError>(())
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod policy;
pub mod redactor;
pub mod registry;
pub mod signer;

pub use config::{ContextConfig, ShieldConfig};
pub use context::{ContextId, IntegrationContext};
pub use engine::{DecryptedPayload, EncryptionEngine};
pub use envelope::EncryptedEnvelope;
pub use error::{ShieldError, ShieldResult};
pub use policy::ProtectionPolicy;
pub use redactor::FieldRedactor;
pub use registry::{ConfigurationRegistry, VerificationReport};
pub use signer::{RequestSigner, SignatureCheck, SignedRequestToken, sign_request};

pub use payshield_crypto::{VaultCipherText, VaultKey, decrypt_record, decrypt_value, encrypt_value};
