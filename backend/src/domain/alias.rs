//! Domain aliases and the provisioning error taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::hostname::{DomainName, MountPoint, MountPointSyntaxError, NameSyntaxError};
use super::{AliasId, ClientId, DomainId, Error, ItemStatus, QuotaLimit, ResellerId, UsageCounters};

/// Persisted domain alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAlias {
    pub id: AliasId,
    pub domain_id: DomainId,
    pub name: DomainName,
    pub mount_point: MountPoint,
    pub status: ItemStatus,
    /// IP binding copied from the owning domain.
    pub ip_id: i64,
    pub forward_url: Option<String>,
}

/// Alias row to insert. New aliases always start in [`ItemStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDomainAlias {
    pub domain_id: DomainId,
    pub name: DomainName,
    pub mount_point: MountPoint,
    pub ip_id: i64,
    pub forward_url: Option<String>,
}

/// Result of a committed alias insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAlias {
    pub alias: DomainAlias,
    /// Ledger counters recomputed inside the insert transaction.
    pub usage: UsageCounters,
}

/// Client domain visible to a reseller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedDomain {
    pub id: DomainId,
    pub name: String,
    pub client_id: ClientId,
    pub reseller_id: ResellerId,
    pub ip_id: i64,
}

/// Domain entry offered by the alias form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainChoice {
    pub domain_id: DomainId,
    pub domain_name: String,
}

/// A reseller's client together with the domains it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDomains {
    pub client_id: ClientId,
    pub client_name: String,
    pub domains: Vec<DomainChoice>,
}

/// Why alias creation was refused.
///
/// Variants are listed in the order the preconditions are evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AliasProvisionError {
    #[error("domain {domain_id} was not found")]
    DomainNotFound { domain_id: DomainId },
    #[error("alias quota reached ({current} of {limit})")]
    QuotaExceeded { current: u64, limit: QuotaLimit },
    #[error("invalid alias name: {0}")]
    InvalidName(NameSyntaxError),
    #[error("'{name}' is already used by a domain or alias")]
    NameTaken { name: String },
    #[error("'{name}' is reserved for the panel host")]
    ReservedName { name: String },
    #[error("invalid forward target: {0}")]
    InvalidForwardTarget(NameSyntaxError),
    #[error("invalid mount point: {0}")]
    InvalidMountPoint(MountPointSyntaxError),
    #[error("mount point '{mount_point}' is already in use")]
    MountPointTaken { mount_point: String },
    #[error("alias storage failed: {message}")]
    Storage { message: String, retryable: bool },
}

impl AliasProvisionError {
    /// Snake-case code carried in `details.code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DomainNotFound { .. } => "domain_not_found",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::InvalidName(_) => "invalid_name",
            Self::NameTaken { .. } => "name_taken",
            Self::ReservedName { .. } => "reserved_name",
            Self::InvalidForwardTarget(_) => "invalid_forward_target",
            Self::InvalidMountPoint(_) => "invalid_mount_point",
            Self::MountPointTaken { .. } => "mount_point_taken",
            Self::Storage { .. } => "storage",
        }
    }
}

fn limit_detail(limit: QuotaLimit) -> serde_json::Value {
    match limit {
        QuotaLimit::Limited(max) => json!(max),
        other => json!(other.to_string()),
    }
}

impl From<AliasProvisionError> for Error {
    fn from(err: AliasProvisionError) -> Self {
        let code = err.code();
        let message = err.to_string();
        match err {
            AliasProvisionError::DomainNotFound { domain_id } => Error::not_found(message)
                .with_details(json!({ "code": code, "domainId": domain_id })),
            AliasProvisionError::QuotaExceeded { current, limit } => Error::forbidden(message)
                .with_details(json!({
                    "code": code,
                    "current": current,
                    "limit": limit_detail(limit),
                })),
            AliasProvisionError::InvalidName(_) | AliasProvisionError::ReservedName { .. } => {
                Error::invalid_request(message)
                    .with_details(json!({ "code": code, "field": "aliasName" }))
            }
            AliasProvisionError::InvalidForwardTarget(_) => Error::invalid_request(message)
                .with_details(json!({ "code": code, "field": "forward.target" })),
            AliasProvisionError::InvalidMountPoint(_) => Error::invalid_request(message)
                .with_details(json!({ "code": code, "field": "mountPoint" })),
            AliasProvisionError::NameTaken { name } => Error::conflict(message)
                .with_details(json!({ "code": code, "aliasName": name })),
            AliasProvisionError::MountPointTaken { mount_point } => Error::conflict(message)
                .with_details(json!({ "code": code, "mountPoint": mount_point })),
            AliasProvisionError::Storage { retryable: true, .. } => {
                Error::service_unavailable("alias storage is temporarily unavailable")
                    .with_details(json!({ "code": code }))
            }
            AliasProvisionError::Storage { retryable: false, .. } => {
                Error::internal("failed to create alias").with_details(json!({ "code": code }))
            }
        }
    }
}
