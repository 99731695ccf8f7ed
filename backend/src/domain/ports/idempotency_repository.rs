//! Port for idempotency record persistence.

use async_trait::async_trait;

use crate::domain::{IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency repository adapters.
    pub enum IdempotencyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "idempotency repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "idempotency repository query failed: {message}",
        /// Response snapshot could not be encoded or decoded.
        Serialization { message: String } => "idempotency repository serialization failed: {message}",
        /// A record with this key already exists (concurrent insert race).
        DuplicateKey { message: String } => "idempotency key already exists: {message}",
    }
}

/// Durable idempotency records keyed by `(key, reseller, mutation type)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Look a key up and compare the stored payload hash with the query's.
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError>;

    /// Store a record. A second record for the same key yields
    /// [`IdempotencyRepositoryError::DuplicateKey`].
    async fn store(&self, record: &IdempotencyRecord) -> Result<(), IdempotencyRepositoryError>;
}

/// Repository that never remembers anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdempotencyRepository;

#[async_trait]
impl IdempotencyRepository for FixtureIdempotencyRepository {
    async fn lookup(
        &self,
        _query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        Ok(IdempotencyLookupResult::NotFound)
    }

    async fn store(&self, _record: &IdempotencyRecord) -> Result<(), IdempotencyRepositoryError> {
        Ok(())
    }
}
