//! Request fingerprinting.

use std::fmt;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

const HASH_LEN: usize = 32;

/// Reasons a payload hash cannot be produced or restored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadHashError {
    #[error("payload hash must be {HASH_LEN} bytes, got {actual}")]
    InvalidLength { actual: usize },
    #[error("failed to serialise canonical payload: {message}")]
    Serialization { message: String },
}

/// SHA-256 digest of a canonical JSON request body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; HASH_LEN]);

impl PayloadHash {
    /// Restore a hash from stored bytes.
    ///
    /// # Example
    ///
    /// ```
    /// # use panel::domain::idempotency::PayloadHash;
    /// assert!(PayloadHash::try_from_bytes(&[0u8; 32]).is_ok());
    /// assert!(PayloadHash::try_from_bytes(&[0u8; 4]).is_err());
    /// ```
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, PayloadHashError> {
        let digest: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| PayloadHashError::InvalidLength {
                actual: bytes.len(),
            })?;
        Ok(Self(digest))
    }

    /// Wrap a digest.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash a JSON value after sorting object keys recursively.
///
/// Whitespace and key order do not affect the result; array order does.
///
/// # Example
///
/// ```
/// # use panel::domain::idempotency::canonicalize_and_hash;
/// # use serde_json::json;
/// let first = canonicalize_and_hash(&json!({"name": "a.tld", "mount": "/"}));
/// let second = canonicalize_and_hash(&json!({"mount": "/", "name": "a.tld"}));
/// assert_eq!(first, second);
/// ```
pub fn canonicalize_and_hash(value: &Value) -> Result<PayloadHash, PayloadHashError> {
    let bytes = serde_json::to_vec(&canonicalize(value)).map_err(|err| {
        PayloadHashError::Serialization {
            message: err.to_string(),
        }
    })?;
    Ok(PayloadHash(Sha256::digest(&bytes).into()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, inner)| (key.clone(), canonicalize(inner)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
