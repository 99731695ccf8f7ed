//! Stored idempotency records and lookup types.

use chrono::{DateTime, Utc};

use super::{IdempotencyKey, MutationType, PayloadHash};
use crate::domain::ResellerId;

/// Response snapshot remembered for a key.
#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub mutation_type: MutationType,
    pub payload_hash: PayloadHash,
    /// JSON body returned by the first successful request.
    pub response_snapshot: serde_json::Value,
    pub reseller_id: ResellerId,
    pub created_at: DateTime<Utc>,
}

/// Uniqueness scope of a key: the same UUID may be reused by another
/// reseller or for another operation.
pub type IdempotencyScope<'a> = (&'a IdempotencyKey, ResellerId, MutationType);

impl IdempotencyRecord {
    pub fn scope(&self) -> IdempotencyScope<'_> {
        (&self.key, self.reseller_id, self.mutation_type)
    }
}

/// Outcome of looking a key up.
#[derive(Debug, Clone)]
pub enum IdempotencyLookupResult {
    NotFound,
    /// Same key, same payload: replay the snapshot.
    MatchingPayload(IdempotencyRecord),
    /// Same key, different payload: reject.
    ConflictingPayload(IdempotencyRecord),
}

impl IdempotencyLookupResult {
    /// Compare a stored record, if any, with the payload of a retry.
    pub fn classify(stored: Option<IdempotencyRecord>, payload_hash: &PayloadHash) -> Self {
        match stored {
            None => Self::NotFound,
            Some(record) if &record.payload_hash == payload_hash => Self::MatchingPayload(record),
            Some(record) => Self::ConflictingPayload(record),
        }
    }
}

/// Parameters for an idempotency lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyLookupQuery {
    pub key: IdempotencyKey,
    pub reseller_id: ResellerId,
    pub mutation_type: MutationType,
    pub payload_hash: PayloadHash,
}

impl IdempotencyLookupQuery {
    /// Bundle lookup parameters.
    pub fn new(
        key: IdempotencyKey,
        reseller_id: ResellerId,
        mutation_type: MutationType,
        payload_hash: PayloadHash,
    ) -> Self {
        Self {
            key,
            reseller_id,
            mutation_type,
            payload_hash,
        }
    }

    pub fn scope(&self) -> IdempotencyScope<'_> {
        (&self.key, self.reseller_id, self.mutation_type)
    }
}
