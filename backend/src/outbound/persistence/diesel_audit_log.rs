//! PostgreSQL-backed `AuditLog` writing the `log` table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AuditLog, AuditLogError};
use crate::domain::{AuditLogEntry, AuditLogId, audit_message};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{LogRow, NewLogRow};
use super::pool::{DbPool, PoolError};
use super::schema::log;

#[derive(Clone)]
pub struct DieselAuditLog {
    pool: DbPool,
}

impl DieselAuditLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AuditLogError {
    map_basic_pool_error(error, AuditLogError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AuditLogError {
    map_basic_diesel_error(error, AuditLogError::write, AuditLogError::connection)
}

#[async_trait]
impl AuditLog for DieselAuditLog {
    async fn append(
        &self,
        actor_login: &str,
        action: &str,
    ) -> Result<AuditLogEntry, AuditLogError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let message = audit_message(actor_login, action);

        let row: LogRow = diesel::insert_into(log::table)
            .values(&NewLogRow {
                log_message: &message,
            })
            .returning(LogRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(AuditLogEntry {
            id: AuditLogId::new(row.log_id),
            logged_at: row.log_time,
            message: row.log_message,
        })
    }
}
