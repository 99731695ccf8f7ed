//! Domain primitives, services and ports of the reseller panel.
//!
//! Purpose: keep the quota rules, alias validation and provisioning flow free
//! of HTTP and SQL concerns. Inbound adapters call the driving ports in
//! [`ports`]; outbound adapters implement the driven ones.
//!
//! Public surface:
//! - `Error`: API error response payload.
//! - Quota types (`QuotaLimit`, `UsageCounters`, `ResellerQuota`) and the
//!   `QuotaLedgerService`.
//! - Validation (`DomainName`, `MountPoint`, `ForwardTarget`).
//! - `AliasProvisioningService` with its `ProvisioningPolicy`.
//! - `ResellerOverviewService` and its read model.

pub mod alias;
pub mod alias_provisioning;
pub mod audit;
pub mod auth;
pub mod error;
pub mod hostname;
pub mod idempotency;
pub mod ids;
pub mod ports;
pub mod quota;
pub mod quota_ledger;
pub mod reseller_overview;
pub mod status;
pub mod trace_id;

pub use self::alias::{
    AliasProvisionError, ClientDomains, DomainAlias, DomainChoice, NewDomainAlias, OwnedDomain,
    PersistedAlias,
};
pub use self::alias_provisioning::{
    AliasProvisioningPorts, AliasProvisioningService, ProvisioningPolicy,
};
pub use self::audit::{AuditLogEntry, audit_message};
pub use self::auth::{LoginCredentials, LoginValidationError, RequestContext, ResellerSession};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::hostname::{
    DEFAULT_MAX_DOMAIN_LABELS, DomainName, ForwardPrefix, ForwardTarget, LabelRule, MountPoint,
    MountPointSyntaxError, NameSyntaxError, ParseForwardPrefixError, validate_domain_name,
    validate_mount_point,
};
pub use self::idempotency::{
    IdempotencyKey, IdempotencyKeyValidationError, IdempotencyLookupQuery,
    IdempotencyLookupResult, IdempotencyRecord, MutationType, ParseMutationTypeError,
    PayloadHash, PayloadHashError, canonicalize_and_hash,
};
pub use self::ids::{AliasId, AuditLogId, ClientId, DomainId, ResellerId};
pub use self::quota::{
    BYTES_PER_MIB, ParseResourceError, QuotaLimit, QuotaLimitError, QuotaLimits, ResellerQuota,
    Resource, UsageCounters,
};
pub use self::quota_ledger::QuotaLedgerService;
pub use self::reseller_overview::{
    OverviewNotices, OverviewWarning, ResellerAccount, ResellerFeatures, ResellerOverview,
    ResellerOverviewRecord, ResellerOverviewService, UsageBar, UsageLine, UsageStatus,
};
pub use self::status::{ItemStatus, ParseItemStatusError};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use panel::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
