//! Wire form of an asymmetrically protected extract.
//!
//! An envelope travels as three sibling keys inside the request or response
//! object: `encryptedData`, `encryptionKeyId` and `encryptionType`. These
//! names and the `RSA-OAEP-SHA256` type string are fixed by the
//! counterparty's verifier and must not change.

use payshield_crypto::OAEP_ALGORITHM;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ENCRYPTED_DATA_FIELD: &str = "encryptedData";
pub const ENCRYPTION_KEY_ID_FIELD: &str = "encryptionKeyId";
pub const ENCRYPTION_TYPE_FIELD: &str = "encryptionType";

/// The envelope fields, in wire order.
pub const ENVELOPE_FIELDS: [&str; 3] = [
    ENCRYPTED_DATA_FIELD,
    ENCRYPTION_KEY_ID_FIELD,
    ENCRYPTION_TYPE_FIELD,
];

/// One RSA-OAEP encrypted extract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedEnvelope {
    /// Base64 (standard alphabet, padded) RSA-OAEP ciphertext.
    pub encrypted_data: String,
    /// Key id of the integration context that produced it.
    pub encryption_key_id: String,
    /// Always [`OAEP_ALGORITHM`] for envelopes this crate produces.
    pub encryption_type: String,
}

impl EncryptedEnvelope {
    pub(crate) fn new(encrypted_data: String, encryption_key_id: String) -> Self {
        Self {
            encrypted_data,
            encryption_key_id,
            encryption_type: OAEP_ALGORITHM.to_string(),
        }
    }

    /// Reads an envelope out of a payload without modifying it.
    ///
    /// Returns `None` if `encryptedData` is absent or not a string. Missing
    /// key id or type fields read as empty strings.
    pub fn extract(payload: &Map<String, Value>) -> Option<Self> {
        let text = |field: &str| {
            payload
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Some(Self {
            encrypted_data: text(ENCRYPTED_DATA_FIELD)?,
            encryption_key_id: text(ENCRYPTION_KEY_ID_FIELD).unwrap_or_default(),
            encryption_type: text(ENCRYPTION_TYPE_FIELD).unwrap_or_default(),
        })
    }

    /// Writes the three envelope fields into `payload`.
    pub fn merge_into(self, payload: &mut Map<String, Value>) {
        payload.insert(ENCRYPTED_DATA_FIELD.into(), Value::String(self.encrypted_data));
        payload.insert(
            ENCRYPTION_KEY_ID_FIELD.into(),
            Value::String(self.encryption_key_id),
        );
        payload.insert(
            ENCRYPTION_TYPE_FIELD.into(),
            Value::String(self.encryption_type),
        );
    }

    /// Removes the three envelope fields from `payload`.
    pub fn strip_from(payload: &mut Map<String, Value>) {
        for field in ENVELOPE_FIELDS {
            payload.remove(field);
        }
    }

    pub fn is_oaep_sha256(&self) -> bool {
        self.encryption_type == OAEP_ALGORITHM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_exact_wire_keys() {
        let env = EncryptedEnvelope::new("Zm9v".into(), "key-1".into());
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(
            value,
            json!({
                "encryptedData": "Zm9v",
                "encryptionKeyId": "key-1",
                "encryptionType": "RSA-OAEP-SHA256"
            })
        );
    }

    #[test]
    fn extract_requires_string_encrypted_data() {
        let with_number = json!({ "encryptedData": 5 });
        assert!(EncryptedEnvelope::extract(with_number.as_object().unwrap()).is_none());

        let bare = json!({ "encryptedData": "abc" });
        let env = EncryptedEnvelope::extract(bare.as_object().unwrap()).unwrap();
        assert_eq!(env.encryption_key_id, "");
        assert!(!env.is_oaep_sha256());
    }

    #[test]
    fn merge_then_strip_leaves_other_fields() {
        let mut payload = json!({ "amount": "1.00" }).as_object().unwrap().clone();
        EncryptedEnvelope::new("x".into(), "k".into()).merge_into(&mut payload);
        assert_eq!(payload.len(), 4);
        EncryptedEnvelope::strip_from(&mut payload);
        assert_eq!(Value::Object(payload), json!({ "amount": "1.00" }));
    }
}
