//! Idempotency primitives for retried alias creation.
//!
//! A client that resubmits `POST /api/v1/aliases` with the same
//! `Idempotency-Key` header gets the original response back instead of a
//! second alias. Keys are scoped to a reseller and a [`MutationType`], and
//! the request body is fingerprinted with [`canonicalize_and_hash`] so a
//! reused key with a different body is detected as a conflict.

mod key;
mod mutation_type;
mod payload;
mod record;

pub use key::{IdempotencyKey, IdempotencyKeyValidationError};
pub use mutation_type::{MutationType, ParseMutationTypeError};
pub use payload::{PayloadHash, PayloadHashError, canonicalize_and_hash};
pub use record::{
    IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord, IdempotencyScope,
};
