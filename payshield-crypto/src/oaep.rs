//! RSA-OAEP field encryption.
//!
//! Uses RSA with OAEP padding where SHA-256 is both the label hash and the
//! MGF1 hash. This is a field-level cipher: there is no chunking, so the
//! plaintext must fit in a single block (`modulus_bytes - 2 * 32 - 2`).
//!
//! Direction is fixed by the types. Encryption only accepts a
//! [`PeerPublicKey`] (the counterparty's credential) and decryption only
//! accepts a [`LocalPrivateKey`] (this process's key).

use crate::error::{CryptoError, CryptoResult};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use std::fmt;
use x509_cert::Certificate;
use x509_cert::der::pem::decode_label;
use x509_cert::der::{DecodePem, Encode};

/// Wire identifier for the envelope `encryptionType` field.
pub const OAEP_ALGORITHM: &str = "RSA-OAEP-SHA256";

/// Output size of the OAEP hash (SHA-256).
pub const OAEP_HASH_SIZE: usize = 32;

const LABEL_CERTIFICATE: &str = "CERTIFICATE";
const LABEL_SPKI: &str = "PUBLIC KEY";
const LABEL_PKCS1_PUBLIC: &str = "RSA PUBLIC KEY";
const LABEL_PKCS8: &str = "PRIVATE KEY";
const LABEL_PKCS1_PRIVATE: &str = "RSA PRIVATE KEY";
const LABEL_PKCS8_ENCRYPTED: &str = "ENCRYPTED PRIVATE KEY";

/// The counterparty's RSA public key, the only valid encryption target.
#[derive(Clone, PartialEq)]
pub struct PeerPublicKey {
    key: RsaPublicKey,
}

impl PeerPublicKey {
    /// Parses a PEM certificate (`CERTIFICATE`), SPKI public key
    /// (`PUBLIC KEY`) or PKCS#1 public key (`RSA PUBLIC KEY`).
    ///
    /// For a certificate chain the first (leaf) certificate is used.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        Ok(Self {
            key: parse_public_pem(pem)?,
        })
    }

    /// Modulus size in bytes; also the ciphertext length for this key.
    pub fn modulus_bytes(&self) -> usize {
        self.key.size()
    }

    /// Largest plaintext OAEP-SHA256 can seal under this key.
    pub fn max_plaintext_len(&self) -> usize {
        self.modulus_bytes().saturating_sub(2 * OAEP_HASH_SIZE + 2)
    }
}

impl fmt::Debug for PeerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerPublicKey")
            .field("modulus_bits", &(self.modulus_bytes() * 8))
            .finish()
    }
}

/// This process's RSA private key, used only for decryption.
///
/// The inner key zeroizes itself on drop.
#[derive(Clone)]
pub struct LocalPrivateKey {
    key: RsaPrivateKey,
}

impl LocalPrivateKey {
    /// Parses a PKCS#8 (`PRIVATE KEY`) or PKCS#1 (`RSA PRIVATE KEY`) PEM.
    ///
    /// Only the first PEM block is read, so a key file with the certificate
    /// appended works.
    pub fn from_pem(pem: &str) -> CryptoResult<Self> {
        let (label, block) = first_pem_block(pem)?;
        let key = match label {
            LABEL_PKCS8 => RsaPrivateKey::from_pkcs8_pem(block)
                .map_err(|e| CryptoError::InvalidKey(format!("PKCS#8 private key: {e}")))?,
            LABEL_PKCS1_PRIVATE => RsaPrivateKey::from_pkcs1_pem(block)
                .map_err(|e| CryptoError::InvalidKey(format!("PKCS#1 private key: {e}")))?,
            LABEL_PKCS8_ENCRYPTED => {
                return Err(CryptoError::InvalidKey(
                    "passphrase-protected private keys are not supported".to_string(),
                ));
            }
            other => {
                return Err(CryptoError::InvalidKey(format!(
                    "unexpected PEM label {other:?} for a private key"
                )));
            }
        };

        Ok(Self { key })
    }

    /// Modulus size in bytes; the expected ciphertext length.
    pub fn modulus_bytes(&self) -> usize {
        self.key.size()
    }

    /// Returns true if `pem` holds the public half of this key.
    ///
    /// Used to check that a client certificate was issued for this key.
    pub fn matches_certificate(&self, pem: &str) -> CryptoResult<bool> {
        let public = parse_public_pem(pem)?;
        Ok(self.key.to_public_key() == public)
    }
}

impl fmt::Debug for LocalPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalPrivateKey")
            .field("modulus_bits", &(self.modulus_bytes() * 8))
            .finish_non_exhaustive()
    }
}

/// Encrypts `plaintext` to the peer with RSA-OAEP-SHA256.
///
/// The output length is always [`PeerPublicKey::modulus_bytes`].
pub fn oaep_encrypt(peer: &PeerPublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let max = peer.max_plaintext_len();
    if plaintext.len() > max {
        return Err(CryptoError::PlaintextTooLarge {
            len: plaintext.len(),
            max,
        });
    }

    peer.key
        .encrypt(&mut rand_core::OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("{OAEP_ALGORITHM}: {e}")))
}

/// Decrypts an RSA-OAEP-SHA256 ciphertext with the local private key.
pub fn oaep_decrypt(local: &LocalPrivateKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let expected = local.modulus_bytes();
    if ciphertext.len() != expected {
        return Err(CryptoError::Decryption(format!(
            "ciphertext is {} bytes, key expects {expected}",
            ciphertext.len()
        )));
    }

    local
        .key
        .decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| {
            CryptoError::Decryption(
                "OAEP unpadding failed (wrong key or tampered data)".to_string(),
            )
        })
}

fn parse_public_pem(pem: &str) -> CryptoResult<RsaPublicKey> {
    let (label, block) = first_pem_block(pem)?;
    match label {
        LABEL_CERTIFICATE => {
            let cert = Certificate::from_pem(block.as_bytes())
                .map_err(|e| CryptoError::InvalidKey(format!("X.509 certificate: {e}")))?;
            let spki = cert
                .tbs_certificate
                .subject_public_key_info
                .to_der()
                .map_err(|e| CryptoError::InvalidKey(format!("certificate SPKI: {e}")))?;
            RsaPublicKey::from_public_key_der(&spki).map_err(|e| {
                CryptoError::InvalidKey(format!("certificate does not carry an RSA key: {e}"))
            })
        }
        LABEL_SPKI => RsaPublicKey::from_public_key_pem(block)
            .map_err(|e| CryptoError::InvalidKey(format!("SPKI public key: {e}"))),
        LABEL_PKCS1_PUBLIC => RsaPublicKey::from_pkcs1_pem(block)
            .map_err(|e| CryptoError::InvalidKey(format!("PKCS#1 public key: {e}"))),
        other => Err(CryptoError::InvalidKey(format!(
            "unexpected PEM label {other:?} for a public credential"
        ))),
    }
}

/// Cuts the first PEM block out of `pem` and returns its label with it.
///
/// Text before the block and any blocks after it are ignored.
fn first_pem_block(pem: &str) -> CryptoResult<(&str, &str)> {
    const BEGIN: &str = "-----BEGIN ";
    const END: &str = "-----END ";
    const DASHES: &str = "-----";

    let not_pem = || CryptoError::InvalidKey("credential is not PEM encoded".to_string());

    let rest = &pem[pem.find(BEGIN).ok_or_else(not_pem)?..];
    let end = rest.find(END).ok_or_else(not_pem)? + END.len();
    let close = rest[end..].find(DASHES).ok_or_else(not_pem)? + DASHES.len();
    let block = &rest[..end + close];

    let label = decode_label(block.as_bytes())
        .map_err(|e| CryptoError::InvalidKey(format!("PEM encapsulation: {e}")))?;
    Ok((label, block))
}
