//! PostgreSQL-backed `IdempotencyRepository` implementation.
//!
//! Records are scoped by `(key, reseller_id, mutation_type)`. A concurrent
//! insert of the same scope surfaces as `DuplicateKey` so the caller can
//! re-read the winning record.

use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{IdempotencyRepository, IdempotencyRepositoryError};
use crate::domain::{
    IdempotencyKey, IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord,
    MutationType, PayloadHash, ResellerId,
};

use super::diesel_basic_error_mapping::{is_unique_violation, map_basic_diesel_error};
use super::models::{IdempotencyKeyRow, NewIdempotencyKeyRow};
use super::pool::{DbPool, PoolError};
use super::schema::idempotency_keys;

/// Diesel-backed idempotency records.
#[derive(Clone)]
pub struct DieselIdempotencyRepository {
    pool: DbPool,
}

impl DieselIdempotencyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> IdempotencyRepositoryError {
    IdempotencyRepositoryError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> IdempotencyRepositoryError {
    if is_unique_violation(&error) {
        return IdempotencyRepositoryError::duplicate_key("concurrent insert detected");
    }
    map_basic_diesel_error(
        error,
        IdempotencyRepositoryError::query,
        IdempotencyRepositoryError::connection,
    )
}

fn row_to_record(row: IdempotencyKeyRow) -> Result<IdempotencyRecord, IdempotencyRepositoryError> {
    let payload_hash = PayloadHash::try_from_bytes(&row.payload_hash).map_err(|err| {
        IdempotencyRepositoryError::serialization(format!("corrupted payload hash: {err}"))
    })?;
    let mutation_type = MutationType::from_str(&row.mutation_type).map_err(|err| {
        IdempotencyRepositoryError::serialization(format!("invalid mutation type: {err}"))
    })?;

    Ok(IdempotencyRecord {
        key: IdempotencyKey::from_uuid(row.key),
        mutation_type,
        payload_hash,
        response_snapshot: row.response_snapshot,
        reseller_id: ResellerId::new(row.reseller_id),
        created_at: row.created_at,
    })
}

#[async_trait]
impl IdempotencyRepository for DieselIdempotencyRepository {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<IdempotencyKeyRow> = idempotency_keys::table
            .filter(
                idempotency_keys::key
                    .eq(query.key.as_uuid())
                    .and(idempotency_keys::reseller_id.eq(query.reseller_id.get()))
                    .and(idempotency_keys::mutation_type.eq(query.mutation_type.as_str())),
            )
            .select(IdempotencyKeyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let stored = row.map(row_to_record).transpose()?;
        Ok(IdempotencyLookupResult::classify(stored, &query.payload_hash))
    }

    async fn store(&self, record: &IdempotencyRecord) -> Result<(), IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_record = NewIdempotencyKeyRow {
            key: *record.key.as_uuid(),
            reseller_id: record.reseller_id.get(),
            mutation_type: record.mutation_type.as_str(),
            payload_hash: record.payload_hash.as_bytes(),
            response_snapshot: &record.response_snapshot,
            created_at: record.created_at,
        };

        diesel::insert_into(idempotency_keys::table)
            .values(&new_record)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
