//! Discriminator isolating idempotency keys per operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operation protected by an idempotency key.
///
/// The same UUID may be reused across different operations without the
/// records colliding.
///
/// # Example
///
/// ```
/// # use panel::domain::idempotency::MutationType;
/// assert_eq!(MutationType::AliasCreation.as_str(), "alias_creation");
/// assert_eq!(
///     "alias_creation".parse::<MutationType>(),
///     Ok(MutationType::AliasCreation)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum MutationType {
    /// `POST /api/v1/aliases`.
    AliasCreation,
}

impl MutationType {
    /// Every variant.
    pub const ALL: [MutationType; 1] = [MutationType::AliasCreation];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AliasCreation => "alias_creation",
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown mutation type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mutation type '{input}'")]
pub struct ParseMutationTypeError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for MutationType {
    type Err = ParseMutationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|variant| variant.as_str() == s)
            .copied()
            .ok_or_else(|| ParseMutationTypeError {
                input: s.to_owned(),
            })
    }
}
