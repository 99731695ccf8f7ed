//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their serialised shape and are registered with
//! utoipa's `as = ...` naming so the document refers to the domain paths.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request clashes with existing state.
    #[schema(rename = "conflict")]
    Conflict,
    /// A dependency is unavailable or the request timed out.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "forbidden")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "alias quota reached (5 of 5)")]
    message: String,
    /// Correlation identifier, echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Failure specifics such as `{"code": "quota_exceeded"}`.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::UsageCounters`].
#[derive(ToSchema)]
#[schema(as = crate::domain::UsageCounters, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct UsageCountersSchema {
    domains: u64,
    subdomains: u64,
    aliases: u64,
    mail_accounts: u64,
    ftp_accounts: u64,
    sql_databases: u64,
    sql_users: u64,
    traffic_bytes: u64,
    disk_bytes: u64,
}

/// OpenAPI schema for [`crate::domain::ResellerOverview`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ResellerOverview, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ResellerOverviewSchema {
    /// Login and feature switches.
    #[schema(value_type = Object)]
    account: serde_json::Value,
    /// One line per counted resource.
    #[schema(value_type = Vec<Object>)]
    usage: Vec<serde_json::Value>,
    /// Traffic bar with `usedBytes`, `limitBytes` and `percent`.
    #[schema(value_type = Object)]
    traffic: serde_json::Value,
    /// Disk bar with `usedBytes`, `limitBytes` and `percent`.
    #[schema(value_type = Object)]
    disk: serde_json::Value,
    #[schema(example = json!(["traffic_limit_exceeded"]))]
    warnings: Vec<String>,
    /// Open tickets, pending orders and ordered aliases.
    #[schema(value_type = Object)]
    notices: serde_json::Value,
}

/// OpenAPI schema for [`crate::domain::ports::AliasForm`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::AliasForm, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AliasFormSchema {
    /// Clients with at least one domain, each with its domains.
    #[schema(value_type = Vec<Object>)]
    clients: Vec<serde_json::Value>,
    /// Alias usage line of the reseller.
    #[schema(value_type = Object)]
    alias_quota: serde_json::Value,
    #[schema(example = json!(["http://", "https://", "ftp://"]))]
    forward_prefixes: Vec<String>,
}

/// OpenAPI schema for [`crate::domain::ports::AliasCreated`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::AliasCreated, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AliasCreatedSchema {
    #[schema(example = 42)]
    alias_id: i64,
    #[schema(example = "shop.example.org")]
    alias_name: String,
    #[schema(example = "/shop")]
    mount_point: String,
    #[schema(example = "pending")]
    status: String,
    #[schema(example = "https://example.com")]
    forward_url: Option<String>,
    /// Reseller alias count after the creation.
    alias_usage: u64,
    /// Whether the response was replayed from an earlier request.
    replayed: bool,
}
