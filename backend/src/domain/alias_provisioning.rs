//! Alias provisioning service.
//!
//! Creation runs the preconditions in a fixed order, hands the insert to the
//! repository (one transaction including the ledger recompute) and then
//! fires the side effects. Side effects and the audit entry never fail a
//! committed creation; their errors are logged.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use super::hostname::{
    DEFAULT_MAX_DOMAIN_LABELS, DomainName, ForwardPrefix, ForwardTarget, LabelRule, MountPoint,
};
use super::ports::{
    AliasCreated, AliasForm, AliasFormQuery, AliasProvisioner, AliasProvisioningRequest,
    AliasRepository, AliasRepositoryError, AuditLog, IdempotencyRepository,
    IdempotencyRepositoryError, MailboxBootstrap, PropagationSignal, QuotaRepository,
    QuotaRepositoryError,
};
use super::quota_ledger::map_quota_error;
use super::{
    AliasProvisionError, DomainAlias, Error, IdempotencyKey, IdempotencyLookupQuery,
    IdempotencyLookupResult, IdempotencyRecord, MutationType, NewDomainAlias, OwnedDomain,
    PayloadHash, QuotaLimit, RequestContext, ResellerId, Resource, TraceId, UsageLine,
    canonicalize_and_hash,
};

/// Deployment settings that shape alias creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningPolicy {
    /// Host name of the panel itself; never usable as an alias.
    pub base_server_vhost: String,
    /// Label ceiling for the strict name rule.
    pub max_domain_labels: usize,
    /// Create `abuse@`, `hostmaster@`, `postmaster@` and `webmaster@`.
    pub create_default_email_addresses: bool,
    /// Whether default mailboxes count towards the mail quota.
    pub count_default_email_addresses: bool,
}

impl Default for ProvisioningPolicy {
    fn default() -> Self {
        Self {
            base_server_vhost: String::new(),
            max_domain_labels: DEFAULT_MAX_DOMAIN_LABELS,
            create_default_email_addresses: true,
            count_default_email_addresses: false,
        }
    }
}

/// Driven ports used by [`AliasProvisioningService`].
#[derive(Clone)]
pub struct AliasProvisioningPorts {
    pub quota: Arc<dyn QuotaRepository>,
    pub aliases: Arc<dyn AliasRepository>,
    pub audit: Arc<dyn AuditLog>,
    pub mailboxes: Arc<dyn MailboxBootstrap>,
    pub propagation: Arc<dyn PropagationSignal>,
    pub idempotency: Arc<dyn IdempotencyRepository>,
}

/// Implements [`AliasProvisioner`] and [`AliasFormQuery`].
#[derive(Clone)]
pub struct AliasProvisioningService {
    ports: AliasProvisioningPorts,
    policy: ProvisioningPolicy,
}

/// Validated alias ready for insertion.
struct ValidatedAlias {
    domain: OwnedDomain,
    name: DomainName,
    mount_point: MountPoint,
    forward_url: Option<String>,
}

fn map_alias_repository_error(error: AliasRepositoryError) -> AliasProvisionError {
    match error {
        AliasRepositoryError::Connection { message } => AliasProvisionError::Storage {
            message,
            retryable: true,
        },
        AliasRepositoryError::Query { message } => AliasProvisionError::Storage {
            message,
            retryable: false,
        },
        AliasRepositoryError::ResellerNotFound { reseller_id } => AliasProvisionError::Storage {
            message: format!("reseller {reseller_id} has no quota row"),
            retryable: false,
        },
        AliasRepositoryError::QuotaExceeded { current, limit } => {
            AliasProvisionError::QuotaExceeded { current, limit }
        }
        AliasRepositoryError::NameTaken { name } => AliasProvisionError::NameTaken { name },
        AliasRepositoryError::MountPointTaken { mount_point } => {
            AliasProvisionError::MountPointTaken { mount_point }
        }
    }
}

fn map_quota_repository_error(error: QuotaRepositoryError) -> AliasProvisionError {
    let retryable = matches!(error, QuotaRepositoryError::Connection { .. });
    AliasProvisionError::Storage {
        message: error.to_string(),
        retryable,
    }
}

fn map_idempotency_error(error: IdempotencyRepositoryError) -> Error {
    match error {
        IdempotencyRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("idempotency repository unavailable: {message}"))
        }
        IdempotencyRepositoryError::Query { message } => {
            Error::internal(format!("idempotency repository error: {message}"))
        }
        IdempotencyRepositoryError::Serialization { message } => Error::internal(format!(
            "idempotency repository serialization failed: {message}"
        )),
        IdempotencyRepositoryError::DuplicateKey { message } => {
            Error::internal(format!("unexpected idempotency key conflict: {message}"))
        }
    }
}

fn idempotency_conflict() -> Error {
    Error::conflict("idempotency key already used with different payload")
        .with_details(json!({ "code": "idempotency_conflict" }))
}

impl AliasProvisioningService {
    pub fn new(ports: AliasProvisioningPorts, policy: ProvisioningPolicy) -> Self {
        Self { ports, policy }
    }

    fn strict_rule(&self) -> LabelRule {
        LabelRule::Strict {
            max_labels: self.policy.max_domain_labels,
        }
    }

    fn is_base_vhost(&self, name: &DomainName) -> bool {
        let vhost = self.policy.base_server_vhost.trim();
        !vhost.is_empty() && name.as_str().eq_ignore_ascii_case(vhost)
    }

    fn payload_hash(request: &AliasProvisioningRequest) -> Result<PayloadHash, Error> {
        let payload = json!({
            "domainId": request.domain_id,
            "aliasName": request.proposed_name,
            "mountPoint": request.mount_point,
            "forward": request.forward,
        });
        canonicalize_and_hash(&payload)
            .map_err(|err| Error::internal(format!("failed to hash alias payload: {err}")))
    }

    async fn ensure_name_unused(&self, name: &DomainName) -> Result<(), AliasProvisionError> {
        let taken = self
            .ports
            .aliases
            .name_exists(name)
            .await
            .map_err(map_alias_repository_error)?;
        if taken {
            return Err(AliasProvisionError::NameTaken {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn validate(
        &self,
        request: &AliasProvisioningRequest,
    ) -> Result<ValidatedAlias, AliasProvisionError> {
        let reseller_id = request.context.reseller_id;

        let domain = self
            .ports
            .aliases
            .find_owned_domain(reseller_id, request.domain_id)
            .await
            .map_err(map_alias_repository_error)?
            .ok_or(AliasProvisionError::DomainNotFound {
                domain_id: request.domain_id,
            })?;

        let quota = self
            .ports
            .quota
            .find_quota(reseller_id)
            .await
            .map_err(map_quota_repository_error)?
            .ok_or_else(|| AliasProvisionError::Storage {
                message: format!("reseller {reseller_id} has no quota row"),
                retryable: false,
            })?;
        if !quota.can_create(Resource::Alias) {
            return Err(AliasProvisionError::QuotaExceeded {
                current: quota.usage.aliases,
                limit: quota.limits.aliases,
            });
        }

        let name = DomainName::parse(&request.proposed_name, self.strict_rule())
            .map_err(AliasProvisionError::InvalidName)?;
        self.ensure_name_unused(&name).await?;
        if self.is_base_vhost(&name) {
            return Err(AliasProvisionError::ReservedName {
                name: name.to_string(),
            });
        }

        if let Some(forward) = &request.forward {
            let target =
                ForwardTarget::parse(forward.prefix, &forward.target, self.policy.max_domain_labels)
                    .map_err(AliasProvisionError::InvalidForwardTarget)?;
            return Ok(ValidatedAlias {
                domain,
                name,
                mount_point: MountPoint::root(),
                forward_url: Some(target.url()),
            });
        }

        let mount_point = MountPoint::parse(&request.mount_point)
            .map_err(AliasProvisionError::InvalidMountPoint)?;
        self.ensure_name_unused(&name).await?;
        let mount_taken = self
            .ports
            .aliases
            .mount_point_taken(domain.id, &mount_point)
            .await
            .map_err(map_alias_repository_error)?;
        if mount_taken {
            return Err(AliasProvisionError::MountPointTaken {
                mount_point: mount_point.to_string(),
            });
        }

        Ok(ValidatedAlias {
            domain,
            name,
            mount_point,
            forward_url: None,
        })
    }

    async fn provision(
        &self,
        request: &AliasProvisioningRequest,
    ) -> Result<AliasCreated, AliasProvisionError> {
        let validated = self.validate(request).await?;
        let new_alias = NewDomainAlias {
            domain_id: validated.domain.id,
            name: validated.name,
            mount_point: validated.mount_point,
            ip_id: validated.domain.ip_id,
            forward_url: validated.forward_url,
        };

        let persisted = self
            .ports
            .aliases
            .insert_alias(request.context.reseller_id, &new_alias)
            .await
            .map_err(map_alias_repository_error)?;

        info!(
            reseller_id = request.context.reseller_id.get(),
            alias_id = persisted.alias.id.get(),
            alias_name = %persisted.alias.name,
            alias_usage = persisted.usage.aliases,
            "domain alias created"
        );

        self.run_side_effects(&request.context, &persisted.alias).await;

        Ok(AliasCreated {
            alias_id: persisted.alias.id,
            alias_name: persisted.alias.name.to_string(),
            mount_point: persisted.alias.mount_point.to_string(),
            status: persisted.alias.status,
            forward_url: persisted.alias.forward_url,
            alias_usage: persisted.usage.aliases,
            replayed: false,
        })
    }

    async fn run_side_effects(&self, context: &RequestContext, alias: &DomainAlias) {
        if self.policy.create_default_email_addresses {
            self.bootstrap_mailboxes(context.reseller_id, alias).await;
        }

        if let Err(err) = self.ports.propagation.request_propagation().await {
            warn!(alias_id = alias.id.get(), error = %err, "propagation request failed");
        }

        let action = format!("add domain alias: {}", alias.name);
        if let Err(err) = self.ports.audit.append(&context.actor_login, &action).await {
            warn!(alias_id = alias.id.get(), error = %err, "audit log write failed");
        }
    }

    async fn bootstrap_mailboxes(&self, reseller_id: ResellerId, alias: &DomainAlias) {
        match self.ports.mailboxes.create_default_mailboxes(alias).await {
            Ok(created) if created > 0 && self.policy.count_default_email_addresses => {
                if let Err(err) = self.ports.quota.recompute(reseller_id).await {
                    warn!(
                        reseller_id = reseller_id.get(),
                        error = %err,
                        "usage recompute after mailbox bootstrap failed"
                    );
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(alias_id = alias.id.get(), error = %err, "default mailbox bootstrap failed");
            }
        }
    }

    async fn create_and_report(
        &self,
        request: &AliasProvisioningRequest,
    ) -> Result<AliasCreated, Error> {
        self.provision(request).await.map_err(|err| {
            if let AliasProvisionError::Storage { message, .. } = &err {
                error!(
                    reseller_id = request.context.reseller_id.get(),
                    error = %message,
                    "alias storage failed"
                );
            }
            Error::from(err)
        })
    }

    /// Runs on its own task: the record is written even when the caller
    /// stops polling after the commit, e.g. on a request deadline.
    async fn store_detached(
        &self,
        record: IdempotencyRecord,
    ) -> Result<(), IdempotencyRepositoryError> {
        let idempotency = Arc::clone(&self.ports.idempotency);
        let store = async move { idempotency.store(&record).await };
        let task = match TraceId::current() {
            Some(trace_id) => tokio::spawn(TraceId::scope(trace_id, store)),
            None => tokio::spawn(store),
        };
        task.await
            .unwrap_or_else(|err| Err(IdempotencyRepositoryError::query(err.to_string())))
    }

    async fn replay_after_race(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<AliasCreated, Error> {
        let result = self
            .ports
            .idempotency
            .lookup(query)
            .await
            .map_err(map_idempotency_error)?;
        match result {
            IdempotencyLookupResult::MatchingPayload(record) => Self::replay(record),
            IdempotencyLookupResult::ConflictingPayload(_) => Err(idempotency_conflict()),
            IdempotencyLookupResult::NotFound => Err(Error::internal(
                "idempotency record disappeared during race resolution",
            )),
        }
    }

    fn replay(record: IdempotencyRecord) -> Result<AliasCreated, Error> {
        let mut response: AliasCreated = serde_json::from_value(record.response_snapshot)
            .map_err(|err| Error::internal(format!("failed to deserialize response: {err}")))?;
        response.replayed = true;
        Ok(response)
    }

    async fn create_idempotently(
        &self,
        request: &AliasProvisioningRequest,
        key: IdempotencyKey,
    ) -> Result<AliasCreated, Error> {
        let payload_hash = Self::payload_hash(request)?;
        let query = IdempotencyLookupQuery::new(
            key.clone(),
            request.context.reseller_id,
            MutationType::AliasCreation,
            payload_hash.clone(),
        );

        let lookup = self
            .ports
            .idempotency
            .lookup(&query)
            .await
            .map_err(map_idempotency_error)?;
        match lookup {
            IdempotencyLookupResult::MatchingPayload(record) => return Self::replay(record),
            IdempotencyLookupResult::ConflictingPayload(_) => return Err(idempotency_conflict()),
            IdempotencyLookupResult::NotFound => {}
        }

        let response = self.create_and_report(request).await?;
        let response_snapshot = serde_json::to_value(&response)
            .map_err(|err| Error::internal(format!("failed to serialize response: {err}")))?;
        let record = IdempotencyRecord {
            key,
            mutation_type: MutationType::AliasCreation,
            payload_hash,
            response_snapshot,
            reseller_id: request.context.reseller_id,
            created_at: chrono::Utc::now(),
        };

        match self.store_detached(record).await {
            Ok(()) => Ok(response),
            Err(IdempotencyRepositoryError::DuplicateKey { .. }) => {
                self.replay_after_race(&query).await
            }
            Err(err) => {
                // The alias is already committed.
                warn!(
                    alias_id = response.alias_id.get(),
                    error = %err,
                    "failed to store idempotency record"
                );
                Ok(response)
            }
        }
    }
}

#[async_trait]
impl AliasProvisioner for AliasProvisioningService {
    async fn create_alias(&self, request: AliasProvisioningRequest) -> Result<AliasCreated, Error> {
        match request.idempotency_key.clone() {
            Some(key) => self.create_idempotently(&request, key).await,
            None => self.create_and_report(&request).await,
        }
    }
}

#[async_trait]
impl AliasFormQuery for AliasProvisioningService {
    async fn alias_form(&self, context: &RequestContext) -> Result<AliasForm, Error> {
        let quota = self
            .ports
            .quota
            .find_quota(context.reseller_id)
            .await
            .map_err(map_quota_error)?
            .ok_or_else(|| {
                Error::not_found(format!("reseller {} not found", context.reseller_id))
            })?;

        if quota.limits.aliases == QuotaLimit::Disabled {
            return Err(Error::forbidden("domain aliases are disabled for this reseller")
                .with_details(json!({ "code": "aliases_disabled" })));
        }
        if !quota.can_create(Resource::Alias) {
            return Err(Error::forbidden("alias quota reached").with_details(json!({
                "code": "quota_exceeded",
                "current": quota.usage.aliases,
                "limit": quota.limits.aliases.to_string(),
            })));
        }

        let clients = self
            .ports
            .aliases
            .list_client_domains(context.reseller_id)
            .await
            .map_err(|err| Error::from(map_alias_repository_error(err)))?;
        if clients.is_empty() {
            return Err(Error::not_found("there are no clients to add an alias for")
                .with_details(json!({ "code": "no_clients" })));
        }

        Ok(AliasForm {
            clients,
            alias_quota: UsageLine::from_quota(&quota, Resource::Alias),
            forward_prefixes: ForwardPrefix::ALL.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "alias_provisioning_tests.rs"]
mod tests;
