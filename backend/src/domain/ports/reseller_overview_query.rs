//! Driving port for the reseller landing overview.

use async_trait::async_trait;

use crate::domain::{Error, ResellerId, ResellerOverview};

/// Reseller dashboard read model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResellerOverviewQuery: Send + Sync {
    /// Account, usage and notices of one reseller.
    async fn overview(&self, reseller_id: ResellerId) -> Result<ResellerOverview, Error>;
}
