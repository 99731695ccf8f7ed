//! Port for alias persistence and collision checks.
//!
//! [`AliasRepository::insert_alias`] is the only write. Adapters run it as a
//! single transaction that serialises on the reseller's quota row, repeats
//! the quota, name and mount point checks, inserts the alias and recomputes
//! the reseller's usage counters before committing.

use async_trait::async_trait;

use crate::domain::{
    ClientDomains, DomainId, DomainName, MountPoint, NewDomainAlias, OwnedDomain, PersistedAlias,
    QuotaLimit, ResellerId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by alias repository adapters.
    pub enum AliasRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "alias repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "alias repository query failed: {message}",
        /// The reseller owning the alias has no quota row.
        ResellerNotFound { reseller_id: ResellerId } => "reseller {reseller_id} has no quota row",
        /// Quota was exhausted by a concurrent creation.
        QuotaExceeded { current: u64, limit: QuotaLimit } =>
            "alias quota reached ({current} of {limit})",
        /// The name is used by a domain or alias.
        NameTaken { name: String } => "name already in use: {name}",
        /// The mount point is used within the owning domain tree.
        MountPointTaken { mount_point: String } => "mount point already in use: {mount_point}",
    }
}

/// Alias storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Domain owned by one of the reseller's clients.
    async fn find_owned_domain(
        &self,
        reseller_id: ResellerId,
        domain_id: DomainId,
    ) -> Result<Option<OwnedDomain>, AliasRepositoryError>;

    /// Whether any domain or alias already uses the name.
    async fn name_exists(&self, name: &DomainName) -> Result<bool, AliasRepositoryError>;

    /// Whether a subdomain or subdomain alias in the domain's tree uses the
    /// mount point.
    async fn mount_point_taken(
        &self,
        domain_id: DomainId,
        mount_point: &MountPoint,
    ) -> Result<bool, AliasRepositoryError>;

    /// The reseller's clients and their domains, ordered by client name.
    async fn list_client_domains(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Vec<ClientDomains>, AliasRepositoryError>;

    /// Insert an alias and recompute the reseller's counters atomically.
    async fn insert_alias(
        &self,
        reseller_id: ResellerId,
        alias: &NewDomainAlias,
    ) -> Result<PersistedAlias, AliasRepositoryError>;
}

/// Repository without domains, used when no database is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAliasRepository;

#[async_trait]
impl AliasRepository for FixtureAliasRepository {
    async fn find_owned_domain(
        &self,
        _reseller_id: ResellerId,
        _domain_id: DomainId,
    ) -> Result<Option<OwnedDomain>, AliasRepositoryError> {
        Ok(None)
    }

    async fn name_exists(&self, _name: &DomainName) -> Result<bool, AliasRepositoryError> {
        Ok(false)
    }

    async fn mount_point_taken(
        &self,
        _domain_id: DomainId,
        _mount_point: &MountPoint,
    ) -> Result<bool, AliasRepositoryError> {
        Ok(false)
    }

    async fn list_client_domains(
        &self,
        _reseller_id: ResellerId,
    ) -> Result<Vec<ClientDomains>, AliasRepositoryError> {
        Ok(Vec::new())
    }

    async fn insert_alias(
        &self,
        reseller_id: ResellerId,
        _alias: &NewDomainAlias,
    ) -> Result<PersistedAlias, AliasRepositoryError> {
        Err(AliasRepositoryError::reseller_not_found(reseller_id))
    }
}
