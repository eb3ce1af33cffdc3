//! Cryptographic primitives for PayShield.
//!
//! Provides the three primitives the payload-protection layer is built on:
//! - RSA-OAEP (SHA-256 for both the padding hash and MGF1) for field-level
//!   message encryption exchanged with a card-network counterparty
//! - AES-256-CBC for at-rest storage of single sensitive values
//! - HMAC-SHA256 for request-signing digests
//!
//! # Architecture
//!
//! Nothing in this crate touches the filesystem or configuration. Keys come
//! in as PEM text or raw bytes and results go out as values:
//!
//! 1. **Peer keys** ([`PeerPublicKey`]) can only encrypt. They are parsed from
//!    the counterparty's certificate or public key.
//!
//! 2. **Local keys** ([`LocalPrivateKey`]) can only decrypt. There is no way to
//!    obtain an encryption target from a local key, so a message can never be
//!    sealed to ourselves by accident.
//!
//! 3. **Vault keys** ([`VaultKey`]) are symmetric, zeroized on drop, and
//!    produce `<ivHex>:<cipherHex>` records with a fresh IV every call.

mod error;
pub mod mac;
pub mod oaep;
pub mod vault;

pub use error::{CryptoError, CryptoResult};
pub use mac::{hmac_sha256, hmac_sha256_hex, verify_hmac_sha256};
pub use oaep::{
    LocalPrivateKey, OAEP_ALGORITHM, OAEP_HASH_SIZE, PeerPublicKey, oaep_decrypt, oaep_encrypt,
};
pub use vault::{
    IV_SIZE, VAULT_KEY_SIZE, VaultCipherText, VaultKey, decrypt_record, decrypt_value,
    encrypt_value,
};
