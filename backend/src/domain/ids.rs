//! Numeric identifiers for panel entities.
//!
//! Rows are keyed by `BIGSERIAL` columns, so every identifier wraps an `i64`.
//! Distinct newtypes keep a domain id from being passed where an alias id is
//! expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database identifier.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw identifier for persistence adapters.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a reseller account (`admin.admin_id`).
    ResellerId
);
define_id!(
    /// Identifier of a client account (`admin.admin_id`).
    ClientId
);
define_id!(
    /// Identifier of a client's primary domain.
    DomainId
);
define_id!(
    /// Identifier of a domain alias.
    AliasId
);
define_id!(
    /// Identifier of an audit log entry.
    AuditLogId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialise_as_plain_numbers() {
        let value = serde_json::to_value(AliasId::new(42)).expect("serialise id");
        assert_eq!(value, serde_json::json!(42));
    }

    #[test]
    fn ids_round_trip_raw_values() {
        assert_eq!(DomainId::from(7).get(), 7);
        assert_eq!(ResellerId::new(3).to_string(), "3");
    }
}
