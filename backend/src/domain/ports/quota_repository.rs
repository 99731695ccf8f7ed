//! Port for reseller quota rows.
//!
//! Adapters read the stored maxima and cached counters of a reseller and can
//! rebuild the counters from the underlying entities.

use async_trait::async_trait;

use crate::domain::{ResellerId, ResellerQuota, UsageCounters};

use super::define_port_error;

define_port_error! {
    /// Errors raised by quota repository adapters.
    pub enum QuotaRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "quota repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "quota repository query failed: {message}",
        /// A stored value does not follow the quota encoding.
        Corrupt { message: String } => "quota row is corrupt: {message}",
    }
}

/// Storage of reseller limits and usage counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotaRepository: Send + Sync {
    /// Load limits and cached counters; `None` when the reseller is unknown.
    async fn find_quota(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<ResellerQuota>, QuotaRepositoryError>;

    /// Recount every resource and persist the counters.
    ///
    /// Returns `None` when the reseller is unknown.
    async fn recompute(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<UsageCounters>, QuotaRepositoryError>;
}

/// Repository without resellers, used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureQuotaRepository;

#[async_trait]
impl QuotaRepository for FixtureQuotaRepository {
    async fn find_quota(
        &self,
        _reseller_id: ResellerId,
    ) -> Result<Option<ResellerQuota>, QuotaRepositoryError> {
        Ok(None)
    }

    async fn recompute(
        &self,
        _reseller_id: ResellerId,
    ) -> Result<Option<UsageCounters>, QuotaRepositoryError> {
        Ok(None)
    }
}
