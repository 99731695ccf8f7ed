//! Port for the account data behind the reseller overview.

use async_trait::async_trait;

use crate::domain::{ResellerId, ResellerOverviewRecord};

use super::define_port_error;

define_port_error! {
    /// Errors raised by overview repository adapters.
    pub enum ResellerOverviewRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "overview repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "overview repository query failed: {message}",
    }
}

/// Account details, feature flags and pending-work counts of a reseller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResellerOverviewRepository: Send + Sync {
    /// `None` when the reseller is unknown.
    async fn load_overview(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<ResellerOverviewRecord>, ResellerOverviewRepositoryError>;
}

/// Repository without resellers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureResellerOverviewRepository;

#[async_trait]
impl ResellerOverviewRepository for FixtureResellerOverviewRepository {
    async fn load_overview(
        &self,
        _reseller_id: ResellerId,
    ) -> Result<Option<ResellerOverviewRecord>, ResellerOverviewRepositoryError> {
        Ok(None)
    }
}
