//! Reseller quota primitives.
//!
//! Limits are stored as signed integers where `0` means unlimited and `-1`
//! means the resource is disabled for the reseller. [`QuotaLimit`] turns that
//! encoding into an explicit tri-state so callers never compare against magic
//! numbers.
//!
//! Counted resources (domains, aliases, mailboxes, ...) measure rows. Traffic
//! and disk are measured quantities: usage is tracked in bytes while limits
//! are configured in MiB.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ResellerId;

/// Number of bytes in one MiB, the unit of traffic and disk limits.
pub const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Resource kinds tracked by the quota ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Client primary domains.
    Domain,
    /// Subdomains and subdomain aliases.
    Subdomain,
    /// Domain aliases.
    Alias,
    /// Mail accounts.
    Mail,
    /// FTP accounts.
    Ftp,
    /// SQL databases.
    SqlDatabase,
    /// SQL users.
    SqlUser,
    /// Monthly traffic.
    Traffic,
    /// Disk space.
    Disk,
}

impl Resource {
    /// All resources in display order.
    pub const ALL: [Resource; 9] = [
        Resource::Domain,
        Resource::Subdomain,
        Resource::Alias,
        Resource::Mail,
        Resource::Ftp,
        Resource::SqlDatabase,
        Resource::SqlUser,
        Resource::Traffic,
        Resource::Disk,
    ];

    /// Stable string form used in payloads and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Subdomain => "subdomain",
            Self::Alias => "alias",
            Self::Mail => "mail",
            Self::Ftp => "ftp",
            Self::SqlDatabase => "sql_database",
            Self::SqlUser => "sql_user",
            Self::Traffic => "traffic",
            Self::Disk => "disk",
        }
    }

    /// Whether usage is a byte quantity rather than a row count.
    pub fn is_measured(&self) -> bool {
        matches!(self, Self::Traffic | Self::Disk)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown resource name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quota resource '{input}'")]
pub struct ParseResourceError {
    /// The rejected input.
    pub input: String,
}

impl FromStr for Resource {
    type Err = ParseResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|resource| resource.as_str() == s)
            .copied()
            .ok_or_else(|| ParseResourceError {
                input: s.to_owned(),
            })
    }
}

/// Maximum allowance for one resource.
///
/// # Examples
/// ```
/// use panel::domain::QuotaLimit;
///
/// assert_eq!(QuotaLimit::from_raw(0), Ok(QuotaLimit::Unlimited));
/// assert_eq!(QuotaLimit::from_raw(-1), Ok(QuotaLimit::Disabled));
/// assert!(QuotaLimit::Limited(5).allows_another(4));
/// assert!(!QuotaLimit::Limited(5).allows_another(5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QuotaLimit {
    /// No upper bound (stored as `0`).
    Unlimited,
    /// The resource may not be used at all (stored as `-1`).
    Disabled,
    /// Upper bound on usage.
    Limited(u64),
}

/// Error raised when a stored limit does not follow the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("quota limit {raw} is neither -1, 0 nor positive")]
pub struct QuotaLimitError {
    /// The stored value.
    pub raw: i64,
}

impl QuotaLimit {
    /// Decode the stored integer form.
    pub fn from_raw(raw: i64) -> Result<Self, QuotaLimitError> {
        match raw {
            0 => Ok(Self::Unlimited),
            -1 => Ok(Self::Disabled),
            n if n > 0 => Ok(Self::Limited(n.unsigned_abs())),
            _ => Err(QuotaLimitError { raw }),
        }
    }

    /// Encode back to the stored integer form.
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Unlimited => 0,
            Self::Disabled => -1,
            Self::Limited(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }

    /// Whether one more unit may be provisioned given `current` usage.
    pub fn allows_another(self, current: u64) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Disabled => false,
            Self::Limited(max) => current < max,
        }
    }

    /// Units still available, or `None` when unlimited.
    pub fn remaining(self, current: u64) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Disabled => Some(0),
            Self::Limited(max) => Some(max.saturating_sub(current)),
        }
    }

    /// Whether `usage` is strictly above a finite limit.
    pub fn is_exceeded_by(self, usage: u64) -> bool {
        matches!(self, Self::Limited(max) if usage > max)
    }
}

impl fmt::Display for QuotaLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Disabled => f.write_str("disabled"),
            Self::Limited(n) => write!(f, "{n}"),
        }
    }
}

/// Current usage per resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub domains: u64,
    pub subdomains: u64,
    pub aliases: u64,
    pub mail_accounts: u64,
    pub ftp_accounts: u64,
    pub sql_databases: u64,
    pub sql_users: u64,
    pub traffic_bytes: u64,
    pub disk_bytes: u64,
}

impl UsageCounters {
    /// Usage for a single resource.
    pub fn get(&self, resource: Resource) -> u64 {
        match resource {
            Resource::Domain => self.domains,
            Resource::Subdomain => self.subdomains,
            Resource::Alias => self.aliases,
            Resource::Mail => self.mail_accounts,
            Resource::Ftp => self.ftp_accounts,
            Resource::SqlDatabase => self.sql_databases,
            Resource::SqlUser => self.sql_users,
            Resource::Traffic => self.traffic_bytes,
            Resource::Disk => self.disk_bytes,
        }
    }

    /// Copy of the counters with one resource replaced.
    #[must_use]
    pub fn with(mut self, resource: Resource, value: u64) -> Self {
        let slot = match resource {
            Resource::Domain => &mut self.domains,
            Resource::Subdomain => &mut self.subdomains,
            Resource::Alias => &mut self.aliases,
            Resource::Mail => &mut self.mail_accounts,
            Resource::Ftp => &mut self.ftp_accounts,
            Resource::SqlDatabase => &mut self.sql_databases,
            Resource::SqlUser => &mut self.sql_users,
            Resource::Traffic => &mut self.traffic_bytes,
            Resource::Disk => &mut self.disk_bytes,
        };
        *slot = value;
        self
    }
}

/// Maximum allowance per resource. Traffic and disk limits are in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub domains: QuotaLimit,
    pub subdomains: QuotaLimit,
    pub aliases: QuotaLimit,
    pub mail_accounts: QuotaLimit,
    pub ftp_accounts: QuotaLimit,
    pub sql_databases: QuotaLimit,
    pub sql_users: QuotaLimit,
    pub traffic_mib: QuotaLimit,
    pub disk_mib: QuotaLimit,
}

impl QuotaLimits {
    /// Limits with every resource unlimited.
    pub const fn unlimited() -> Self {
        Self {
            domains: QuotaLimit::Unlimited,
            subdomains: QuotaLimit::Unlimited,
            aliases: QuotaLimit::Unlimited,
            mail_accounts: QuotaLimit::Unlimited,
            ftp_accounts: QuotaLimit::Unlimited,
            sql_databases: QuotaLimit::Unlimited,
            sql_users: QuotaLimit::Unlimited,
            traffic_mib: QuotaLimit::Unlimited,
            disk_mib: QuotaLimit::Unlimited,
        }
    }

    /// Limit for a single resource, in the resource's configured unit.
    pub fn get(&self, resource: Resource) -> QuotaLimit {
        match resource {
            Resource::Domain => self.domains,
            Resource::Subdomain => self.subdomains,
            Resource::Alias => self.aliases,
            Resource::Mail => self.mail_accounts,
            Resource::Ftp => self.ftp_accounts,
            Resource::SqlDatabase => self.sql_databases,
            Resource::SqlUser => self.sql_users,
            Resource::Traffic => self.traffic_mib,
            Resource::Disk => self.disk_mib,
        }
    }

    /// Copy of the limits with one resource replaced.
    #[must_use]
    pub fn with(mut self, resource: Resource, limit: QuotaLimit) -> Self {
        let slot = match resource {
            Resource::Domain => &mut self.domains,
            Resource::Subdomain => &mut self.subdomains,
            Resource::Alias => &mut self.aliases,
            Resource::Mail => &mut self.mail_accounts,
            Resource::Ftp => &mut self.ftp_accounts,
            Resource::SqlDatabase => &mut self.sql_databases,
            Resource::SqlUser => &mut self.sql_users,
            Resource::Traffic => &mut self.traffic_mib,
            Resource::Disk => &mut self.disk_mib,
        };
        *slot = limit;
        self
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self::unlimited()
    }
}

/// Limits and cached usage counters of one reseller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResellerQuota {
    pub reseller_id: ResellerId,
    pub limits: QuotaLimits,
    pub usage: UsageCounters,
}

impl ResellerQuota {
    /// Whether another unit of a counted resource may be created.
    pub fn can_create(&self, resource: Resource) -> bool {
        self.limits
            .get(resource)
            .allows_another(self.usage.get(resource))
    }
}
