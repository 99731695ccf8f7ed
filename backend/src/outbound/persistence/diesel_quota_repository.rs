//! PostgreSQL-backed `QuotaRepository` implementation.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{QuotaRepository, QuotaRepositoryError};
use crate::domain::{ResellerId, ResellerQuota, UsageCounters};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::ResellerPropsRow;
use super::pool::{DbPool, PoolError};
use super::schema::reseller_props;
use super::usage_ledger::recompute_usage;

/// Diesel-backed quota rows.
#[derive(Clone)]
pub struct DieselQuotaRepository {
    pool: DbPool,
    count_default_mailboxes: bool,
}

impl DieselQuotaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            count_default_mailboxes: false,
        }
    }

    /// Count the default alias mailboxes towards the mail quota.
    pub fn with_default_mailboxes_counted(mut self, counted: bool) -> Self {
        self.count_default_mailboxes = counted;
        self
    }
}

fn map_pool_error(error: PoolError) -> QuotaRepositoryError {
    map_basic_pool_error(error, QuotaRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> QuotaRepositoryError {
    map_basic_diesel_error(
        error,
        QuotaRepositoryError::query,
        QuotaRepositoryError::connection,
    )
}

#[async_trait]
impl QuotaRepository for DieselQuotaRepository {
    async fn find_quota(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<ResellerQuota>, QuotaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<ResellerPropsRow> = reseller_props::table
            .filter(reseller_props::reseller_id.eq(reseller_id.get()))
            .select(ResellerPropsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_quota().map_err(QuotaRepositoryError::corrupt))
            .transpose()
    }

    async fn recompute(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<UsageCounters>, QuotaRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = recompute_usage(&mut conn, reseller_id, self.count_default_mailboxes)
            .await
            .map_err(map_diesel_error)?;

        row.map(|row| row.into_counters().map_err(QuotaRepositoryError::corrupt))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(repo_err, QuotaRepositoryError::Connection { .. }));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn diesel_error_maps_to_query_error() {
        let repo_err = map_diesel_error(diesel::result::Error::NotFound);

        assert!(matches!(repo_err, QuotaRepositoryError::Query { .. }));
    }
}
