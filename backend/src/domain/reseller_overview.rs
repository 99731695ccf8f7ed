//! Reseller landing overview: account, usage lines, usage bars and notices.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ports::{
    QuotaRepository, ResellerOverviewQuery, ResellerOverviewRepository,
    ResellerOverviewRepositoryError,
};
use super::quota_ledger::map_quota_error;
use super::{BYTES_PER_MIB, Error, QuotaLimit, ResellerId, ResellerQuota, Resource};

/// How current usage relates to its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageStatus {
    Unlimited,
    Disabled,
    WithinLimit,
    LimitReached,
    OverLimit,
}

impl UsageStatus {
    /// Classify `current` against `limit`.
    pub fn classify(limit: QuotaLimit, current: u64) -> Self {
        match limit {
            QuotaLimit::Unlimited => Self::Unlimited,
            QuotaLimit::Disabled => Self::Disabled,
            QuotaLimit::Limited(max) if current < max => Self::WithinLimit,
            QuotaLimit::Limited(max) if current == max => Self::LimitReached,
            QuotaLimit::Limited(_) => Self::OverLimit,
        }
    }
}

/// Usage of one counted resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLine {
    pub resource: Resource,
    pub current: u64,
    pub limit: QuotaLimit,
    pub status: UsageStatus,
}

impl UsageLine {
    /// Line for `resource` read from a quota snapshot.
    pub fn from_quota(quota: &ResellerQuota, resource: Resource) -> Self {
        let current = quota.usage.get(resource);
        let limit = quota.limits.get(resource);
        Self {
            resource,
            current,
            limit,
            status: UsageStatus::classify(limit, current),
        }
    }
}

/// Progress bar for a measured resource.
///
/// # Examples
/// ```
/// use panel::domain::{QuotaLimit, UsageBar};
///
/// let bar = UsageBar::new(50 * 1024 * 1024, QuotaLimit::Limited(100));
/// assert_eq!(bar.percent, 50);
/// assert_eq!(UsageBar::new(10, QuotaLimit::Unlimited).percent, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageBar {
    pub used_bytes: u64,
    /// `None` when unlimited or disabled.
    pub limit_bytes: Option<u64>,
    /// Rounded down, capped at 100.
    pub percent: u8,
}

impl UsageBar {
    /// Bar for `used_bytes` against a limit expressed in MiB.
    pub fn new(used_bytes: u64, limit_mib: QuotaLimit) -> Self {
        let limit_bytes = match limit_mib {
            QuotaLimit::Limited(mib) => Some(mib.saturating_mul(BYTES_PER_MIB)),
            QuotaLimit::Unlimited | QuotaLimit::Disabled => None,
        };
        let percent = limit_bytes.map_or(0, |limit| {
            let ratio = u128::from(used_bytes) * 100 / u128::from(limit.max(1));
            u8::try_from(ratio.min(100)).unwrap_or(100)
        });
        Self {
            used_bytes,
            limit_bytes,
            percent,
        }
    }

    /// Whether usage is strictly above a finite limit.
    pub fn is_exceeded(&self) -> bool {
        self.limit_bytes.is_some_and(|limit| self.used_bytes > limit)
    }
}

/// Warning shown above the overview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewWarning {
    TrafficLimitExceeded,
    DiskLimitExceeded,
}

/// Reseller feature switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResellerFeatures {
    pub support_system: bool,
    pub php_ini_system: bool,
    pub software_allowed: bool,
}

/// Reseller account header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResellerAccount {
    pub login: String,
    pub features: ResellerFeatures,
}

/// Raw data loaded by [`ResellerOverviewRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResellerOverviewRecord {
    pub account: ResellerAccount,
    /// Tickets addressed to the reseller awaiting a reply.
    pub open_tickets: u64,
    pub pending_orders: u64,
    /// Aliases in `ordered` status on the reseller's client domains.
    pub ordered_aliases: u64,
}

/// Pending work for the reseller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewNotices {
    /// `None` when the support system is disabled.
    pub open_tickets: Option<u64>,
    pub pending_orders: u64,
    pub ordered_aliases: u64,
}

/// Reseller landing overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResellerOverview {
    pub account: ResellerAccount,
    pub usage: Vec<UsageLine>,
    pub traffic: UsageBar,
    pub disk: UsageBar,
    pub warnings: Vec<OverviewWarning>,
    pub notices: OverviewNotices,
}

impl ResellerOverview {
    /// Combine account data with a quota snapshot.
    pub fn build(record: ResellerOverviewRecord, quota: &ResellerQuota) -> Self {
        let usage = Resource::ALL
            .into_iter()
            .filter(|resource| !resource.is_measured())
            .map(|resource| UsageLine::from_quota(quota, resource))
            .collect();
        let traffic = UsageBar::new(quota.usage.traffic_bytes, quota.limits.traffic_mib);
        let disk = UsageBar::new(quota.usage.disk_bytes, quota.limits.disk_mib);

        let mut warnings = Vec::new();
        if traffic.is_exceeded() {
            warnings.push(OverviewWarning::TrafficLimitExceeded);
        }
        if disk.is_exceeded() {
            warnings.push(OverviewWarning::DiskLimitExceeded);
        }

        let notices = OverviewNotices {
            open_tickets: record
                .account
                .features
                .support_system
                .then_some(record.open_tickets),
            pending_orders: record.pending_orders,
            ordered_aliases: record.ordered_aliases,
        };

        Self {
            account: record.account,
            usage,
            traffic,
            disk,
            warnings,
            notices,
        }
    }
}

/// Overview query backed by the overview and quota repositories.
#[derive(Clone)]
pub struct ResellerOverviewService<O, Q> {
    overview_repo: Arc<O>,
    quota_repo: Arc<Q>,
}

impl<O, Q> ResellerOverviewService<O, Q> {
    pub fn new(overview_repo: Arc<O>, quota_repo: Arc<Q>) -> Self {
        Self {
            overview_repo,
            quota_repo,
        }
    }
}

fn map_overview_error(error: ResellerOverviewRepositoryError) -> Error {
    match error {
        ResellerOverviewRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("overview repository unavailable: {message}"))
        }
        ResellerOverviewRepositoryError::Query { message } => {
            Error::internal(format!("overview repository error: {message}"))
        }
    }
}

#[async_trait]
impl<O, Q> ResellerOverviewQuery for ResellerOverviewService<O, Q>
where
    O: ResellerOverviewRepository,
    Q: QuotaRepository,
{
    async fn overview(&self, reseller_id: ResellerId) -> Result<ResellerOverview, Error> {
        let record = self
            .overview_repo
            .load_overview(reseller_id)
            .await
            .map_err(map_overview_error)?
            .ok_or_else(|| Error::not_found(format!("reseller {reseller_id} not found")))?;
        let quota = self
            .quota_repo
            .find_quota(reseller_id)
            .await
            .map_err(map_quota_error)?
            .ok_or_else(|| Error::not_found(format!("reseller {reseller_id} has no quota")))?;
        Ok(ResellerOverview::build(record, &quota))
    }
}
