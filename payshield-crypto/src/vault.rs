//! At-rest encryption of single sensitive values.
//!
//! Values such as stored card numbers are sealed with AES-256-CBC (PKCS#7
//! padding) under a 32-byte [`VaultKey`]. Each call draws a fresh random
//! 16-byte IV, so sealing the same value twice never yields the same record.
//!
//! The stored form is `<ivHex>:<cipherHex>` with lowercase hex, which the
//! persistence layer keeps verbatim.

use crate::error::{CryptoError, CryptoResult};
use aes::Aes256;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of a vault key in bytes (AES-256).
pub const VAULT_KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector in bytes.
pub const IV_SIZE: usize = 16;

const BLOCK_SIZE: usize = 16;
const SEPARATOR: char = ':';

/// Symmetric key for the vault cipher.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; VAULT_KEY_SIZE]);

impl VaultKey {
    pub fn from_bytes(bytes: [u8; VAULT_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let arr: [u8; VAULT_KEY_SIZE] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: VAULT_KEY_SIZE,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    /// Parses key material as 64 hex characters or base64 of 32 bytes.
    pub fn parse(encoded: &str) -> CryptoResult<Self> {
        let encoded = encoded.trim();
        if encoded.len() == VAULT_KEY_SIZE * 2 && encoded.bytes().all(|b| b.is_ascii_hexdigit()) {
            let mut bytes = hex::decode(encoded)
                .map_err(|e| CryptoError::InvalidKey(format!("vault key hex: {e}")))?;
            let key = Self::from_slice(&bytes);
            bytes.zeroize();
            return key;
        }

        let mut bytes = BASE64
            .decode(encoded)
            .map_err(|_| CryptoError::InvalidKey("vault key is neither hex nor base64".into()))?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    /// Generates a random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; VAULT_KEY_SIZE];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; VAULT_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey(..)")
    }
}

/// One sealed value: the IV and the CBC ciphertext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VaultCipherText {
    iv: [u8; IV_SIZE],
    ciphertext: Vec<u8>,
}

impl VaultCipherText {
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

impl fmt::Display for VaultCipherText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{SEPARATOR}{}",
            hex::encode(self.iv),
            hex::encode(&self.ciphertext)
        )
    }
}

impl FromStr for VaultCipherText {
    type Err = CryptoError;

    fn from_str(record: &str) -> CryptoResult<Self> {
        let (iv_hex, cipher_hex) = record
            .split_once(SEPARATOR)
            .ok_or_else(|| CryptoError::Format("missing ':' separator".to_string()))?;

        if iv_hex.len() != IV_SIZE * 2 {
            return Err(CryptoError::Format(format!(
                "IV segment must be {} hex chars, got {}",
                IV_SIZE * 2,
                iv_hex.len()
            )));
        }
        let iv_bytes =
            hex::decode(iv_hex).map_err(|_| CryptoError::Format("IV segment is not hex".into()))?;
        let ciphertext = hex::decode(cipher_hex)
            .map_err(|_| CryptoError::Format("cipher segment is not hex".into()))?;

        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::Format(format!(
                "cipher segment is {} bytes, expected a non-zero multiple of {BLOCK_SIZE}",
                ciphertext.len()
            )));
        }

        let mut iv = [0u8; IV_SIZE];
        iv.copy_from_slice(&iv_bytes);
        Ok(Self { iv, ciphertext })
    }
}

impl Serialize for VaultCipherText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VaultCipherText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = String::deserialize(deserializer)?;
        record.parse().map_err(serde::de::Error::custom)
    }
}

/// Seals `plaintext` under `key` with a fresh random IV.
pub fn encrypt_value(key: &VaultKey, plaintext: &str) -> CryptoResult<VaultCipherText> {
    let mut iv = [0u8; IV_SIZE];
    rand::rng().fill_bytes(&mut iv);

    let cipher = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| CryptoError::Encryption(format!("AES-256-CBC init: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    Ok(VaultCipherText { iv, ciphertext })
}

/// Opens a sealed value.
pub fn decrypt_value(key: &VaultKey, sealed: &VaultCipherText) -> CryptoResult<String> {
    let cipher = Aes256CbcDec::new_from_slices(key.as_bytes(), &sealed.iv)
        .map_err(|e| CryptoError::Decryption(format!("AES-256-CBC init: {e}")))?;
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&sealed.ciphertext)
        .map_err(|_| {
            CryptoError::Decryption("padding check failed (wrong key or tampered data)".into())
        })?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        CryptoError::Decryption("recovered plaintext is not UTF-8 (wrong key?)".into())
    })
}

/// Parses a stored `<ivHex>:<cipherHex>` record and opens it.
pub fn decrypt_record(key: &VaultKey, record: &str) -> CryptoResult<String> {
    let sealed: VaultCipherText = record.parse()?;
    decrypt_value(key, &sealed)
}
