//! Client-supplied idempotency keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reasons an `Idempotency-Key` header value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdempotencyKeyValidationError {
    #[error("idempotency key must not be empty")]
    EmptyKey,
    #[error("idempotency key must be a valid UUID")]
    InvalidKey,
}

/// UUID sent in the `Idempotency-Key` header.
///
/// The original string is kept alongside the parsed UUID so the stored key
/// matches what the client sent byte for byte.
///
/// # Example
///
/// ```
/// # use panel::domain::idempotency::IdempotencyKey;
/// let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000")
///     .expect("valid UUID");
/// assert_eq!(key.as_ref(), "550e8400-e29b-41d4-a716-446655440000");
/// assert!(IdempotencyKey::new(" 550e8400-e29b-41d4-a716-446655440000").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey {
    uuid: Uuid,
    raw: String,
}

impl IdempotencyKey {
    /// Validate a raw header value.
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        Self::try_from(key.as_ref().to_owned())
    }

    /// Wrap an already parsed UUID, e.g. one loaded from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            raw: uuid.to_string(),
            uuid,
        }
    }

    /// Fresh random key.
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Parsed UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.uuid
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if raw.trim() != raw {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        let uuid = Uuid::parse_str(&raw).map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;
        Ok(Self { uuid, raw })
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.raw
    }
}

impl AsRef<str> for IdempotencyKey {
    fn as_ref(&self) -> &str {
        self.raw.as_str()
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
