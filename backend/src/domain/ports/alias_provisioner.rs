//! Driving ports for alias creation and the data backing the alias form.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AliasId, ClientDomains, DomainId, Error, ForwardPrefix, IdempotencyKey, ItemStatus,
    RequestContext, UsageLine,
};

/// Redirect requested for a forwarding alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    pub prefix: ForwardPrefix,
    pub target: String,
}

/// Alias creation request as received from an inbound adapter.
///
/// Names and paths are raw user input; validation happens in the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasProvisioningRequest {
    pub context: RequestContext,
    pub domain_id: DomainId,
    pub proposed_name: String,
    /// Ignored for forwarding aliases, which always mount at `/`.
    pub mount_point: String,
    pub forward: Option<ForwardRequest>,
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Outcome of a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasCreated {
    pub alias_id: AliasId,
    /// ASCII form of the alias name.
    pub alias_name: String,
    pub mount_point: String,
    pub status: ItemStatus,
    pub forward_url: Option<String>,
    /// Reseller alias count after the creation.
    pub alias_usage: u64,
    /// Whether the response was replayed from an earlier request.
    pub replayed: bool,
}

/// Creates domain aliases for a reseller's clients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AliasProvisioner: Send + Sync {
    /// Validate, persist and announce a new alias.
    ///
    /// Preconditions run in a fixed order and the first failure is returned
    /// without writing anything.
    async fn create_alias(&self, request: AliasProvisioningRequest) -> Result<AliasCreated, Error>;
}

/// Everything needed to render an alias creation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasForm {
    pub clients: Vec<ClientDomains>,
    pub alias_quota: UsageLine,
    pub forward_prefixes: Vec<ForwardPrefix>,
}

/// Read side of the alias form.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AliasFormQuery: Send + Sync {
    /// Form data, or an error when the reseller may not create aliases.
    async fn alias_form(&self, context: &RequestContext) -> Result<AliasForm, Error>;
}
