//! Driving port for reseller quota bookkeeping.
//!
//! The ledger reports and rebuilds counters; it never refuses a write.
//! Enforcement belongs to the callers that create resources.

use async_trait::async_trait;

use crate::domain::{Error, QuotaLimit, ResellerId, ResellerQuota, Resource, UsageCounters};

/// Per-reseller usage counters and maxima.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    /// Cached usage of one resource. Traffic and disk are in bytes.
    async fn current_usage(&self, reseller_id: ResellerId, resource: Resource)
    -> Result<u64, Error>;

    /// Configured maximum of one resource. Traffic and disk are in MiB.
    async fn maximum(&self, reseller_id: ResellerId, resource: Resource)
    -> Result<QuotaLimit, Error>;

    /// Recount every resource from the underlying entities and persist.
    async fn recompute(&self, reseller_id: ResellerId) -> Result<UsageCounters, Error>;

    /// Limits and counters together.
    async fn snapshot(&self, reseller_id: ResellerId) -> Result<ResellerQuota, Error>;
}
