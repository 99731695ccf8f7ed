//! In-memory panel store implementing every driven port.
//!
//! Mirrors the behaviour of the Diesel adapters closely enough for endpoint
//! tests: the alias insert re-checks quota, name and mount point under one
//! lock and recomputes the counters before returning.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::ports::{
    AliasRepository, AliasRepositoryError, AuditLog, AuditLogError, DEFAULT_MAILBOXES,
    IdempotencyRepository, IdempotencyRepositoryError, LoginService, MailboxBootstrap,
    MailboxBootstrapError, PropagationError, PropagationSignal, QuotaRepository,
    QuotaRepositoryError, ResellerOverviewRepository, ResellerOverviewRepositoryError,
};
use crate::domain::{
    AliasId, AliasProvisioningPorts, AliasProvisioningService, AuditLogEntry, AuditLogId,
    ClientDomains, ClientId, DomainAlias, DomainChoice, DomainId, DomainName, Error,
    IdempotencyLookupQuery, IdempotencyLookupResult, IdempotencyRecord, ItemStatus,
    LoginCredentials, MountPoint, NewDomainAlias, OwnedDomain, PersistedAlias,
    ProvisioningPolicy, QuotaLedgerService, QuotaLimits, ResellerAccount, ResellerFeatures,
    ResellerId, ResellerOverviewRecord, ResellerOverviewService, ResellerQuota, ResellerSession,
    UsageCounters, audit_message,
};
use crate::inbound::http::state::HttpStatePorts;

struct ResellerRow {
    login: String,
    password: String,
    limits: QuotaLimits,
    /// Counters of resources the store does not model (ftp, sql, traffic...).
    seeded: UsageCounters,
    usage: UsageCounters,
}

struct ClientRow {
    id: ClientId,
    name: String,
    reseller_id: ResellerId,
}

#[derive(Default)]
struct PanelState {
    resellers: BTreeMap<i64, ResellerRow>,
    clients: Vec<ClientRow>,
    domains: Vec<OwnedDomain>,
    subdomain_mounts: Vec<(DomainId, String)>,
    aliases: Vec<DomainAlias>,
    mailboxes: Vec<String>,
    audit: Vec<AuditLogEntry>,
    idempotency: Vec<IdempotencyRecord>,
    next_id: i64,
}

impl PanelState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn reseller_of_domain(&self, domain_id: DomainId) -> Option<ResellerId> {
        self.domains
            .iter()
            .find(|domain| domain.id == domain_id)
            .map(|domain| domain.reseller_id)
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.domains.iter().any(|domain| domain.name == name)
            || self.aliases.iter().any(|alias| alias.name.as_str() == name)
    }

    fn mount_in_use(&self, domain_id: DomainId, mount_point: &str) -> bool {
        self.subdomain_mounts
            .iter()
            .any(|(id, mount)| *id == domain_id && mount == mount_point)
    }

    fn recompute(
        &mut self,
        reseller_id: ResellerId,
        count_mailboxes: bool,
    ) -> Option<UsageCounters> {
        let domains = self
            .domains
            .iter()
            .filter(|domain| domain.reseller_id == reseller_id)
            .count() as u64;
        let aliases = self
            .aliases
            .iter()
            .filter(|alias| alias.status != ItemStatus::Deleting)
            .filter(|alias| self.reseller_of_domain(alias.domain_id) == Some(reseller_id))
            .count() as u64;
        let mailboxes = if count_mailboxes {
            self.mailboxes.len() as u64
        } else {
            0
        };

        let row = self.resellers.get_mut(&reseller_id.get())?;
        row.usage = UsageCounters {
            domains,
            aliases,
            mail_accounts: row.seeded.mail_accounts + mailboxes,
            ..row.seeded
        };
        Some(row.usage)
    }
}

/// In-memory backing store for tests.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use panel::domain::{ClientId, DomainId, QuotaLimits, ResellerId};
/// use panel::test_support::InMemoryPanel;
///
/// let panel = Arc::new(
///     InMemoryPanel::new()
///         .with_reseller(ResellerId::new(1), "reseller1", "secret", QuotaLimits::unlimited())
///         .with_client(ResellerId::new(1), ClientId::new(10), "alice")
///         .with_domain(ClientId::new(10), DomainId::new(100), "example.org"),
/// );
/// assert!(panel.aliases().is_empty());
/// ```
#[derive(Default)]
pub struct InMemoryPanel {
    state: Mutex<PanelState>,
    count_default_mailboxes: bool,
    failing_side_effects: bool,
    propagations: AtomicU64,
}

impl InMemoryPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_state(self, edit: impl FnOnce(&mut PanelState)) -> Self {
        edit(&mut self.state());
        self
    }

    /// Add a reseller with login credentials and limits.
    #[must_use]
    pub fn with_reseller(
        self,
        reseller_id: ResellerId,
        login: &str,
        password: &str,
        limits: QuotaLimits,
    ) -> Self {
        self.with_state(|state| {
            state.resellers.insert(
                reseller_id.get(),
                ResellerRow {
                    login: login.to_owned(),
                    password: password.to_owned(),
                    limits,
                    seeded: UsageCounters::default(),
                    usage: UsageCounters::default(),
                },
            );
        })
    }

    /// Seed counters for resources the store does not model.
    #[must_use]
    pub fn with_seeded_usage(self, reseller_id: ResellerId, usage: UsageCounters) -> Self {
        self.with_state(|state| {
            if let Some(row) = state.resellers.get_mut(&reseller_id.get()) {
                row.seeded = usage;
                row.usage = usage;
            }
        })
    }

    #[must_use]
    pub fn with_client(self, reseller_id: ResellerId, client_id: ClientId, name: &str) -> Self {
        self.with_state(|state| {
            state.clients.push(ClientRow {
                id: client_id,
                name: name.to_owned(),
                reseller_id,
            });
        })
    }

    /// Add a domain owned by an existing client.
    #[must_use]
    pub fn with_domain(self, client_id: ClientId, domain_id: DomainId, name: &str) -> Self {
        self.with_state(|state| {
            let Some(reseller_id) = state
                .clients
                .iter()
                .find(|client| client.id == client_id)
                .map(|client| client.reseller_id)
            else {
                return;
            };
            state.domains.push(OwnedDomain {
                id: domain_id,
                name: name.to_owned(),
                client_id,
                reseller_id,
                ip_id: 1,
            });
        })
    }

    /// Reserve a mount point inside a domain's tree.
    #[must_use]
    pub fn with_subdomain_mount(self, domain_id: DomainId, mount_point: &str) -> Self {
        self.with_state(|state| {
            state
                .subdomain_mounts
                .push((domain_id, mount_point.to_owned()));
        })
    }

    /// Count default mailboxes towards the mail quota.
    #[must_use]
    pub fn with_default_mailboxes_counted(mut self, counted: bool) -> Self {
        self.count_default_mailboxes = counted;
        self
    }

    /// Make audit, mailbox and propagation calls fail.
    #[must_use]
    pub fn with_failing_side_effects(mut self) -> Self {
        self.failing_side_effects = true;
        self
    }

    /// HTTP ports wired to this store.
    #[must_use]
    pub fn http_ports(self: &Arc<Self>, policy: ProvisioningPolicy) -> HttpStatePorts {
        let provisioner = Arc::new(AliasProvisioningService::new(
            AliasProvisioningPorts {
                quota: self.clone(),
                aliases: self.clone(),
                audit: self.clone(),
                mailboxes: self.clone(),
                propagation: self.clone(),
                idempotency: self.clone(),
            },
            policy,
        ));
        HttpStatePorts {
            login: self.clone(),
            quota: Arc::new(QuotaLedgerService::new(self.clone())),
            aliases: provisioner.clone(),
            alias_form: provisioner,
            overview: Arc::new(ResellerOverviewService::new(self.clone(), self.clone())),
        }
    }

    pub fn aliases(&self) -> Vec<DomainAlias> {
        self.state().aliases.clone()
    }

    pub fn audit_messages(&self) -> Vec<String> {
        self.state()
            .audit
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// Addresses of the default mailboxes created so far.
    pub fn mailboxes(&self) -> Vec<String> {
        self.state().mailboxes.clone()
    }

    pub fn propagations(&self) -> u64 {
        self.propagations.load(Ordering::SeqCst)
    }

    /// Cached counters, as last written by a recompute.
    pub fn usage(&self, reseller_id: ResellerId) -> Option<UsageCounters> {
        self.state()
            .resellers
            .get(&reseller_id.get())
            .map(|row| row.usage)
    }
}

#[async_trait]
impl LoginService for InMemoryPanel {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<ResellerSession, Error> {
        self.state()
            .resellers
            .iter()
            .find(|(_, row)| {
                row.login == credentials.username() && row.password == credentials.password()
            })
            .map(|(id, row)| ResellerSession {
                reseller_id: ResellerId::new(*id),
                login: row.login.clone(),
            })
            .ok_or_else(|| Error::unauthorized("invalid credentials"))
    }
}

#[async_trait]
impl QuotaRepository for InMemoryPanel {
    async fn find_quota(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<ResellerQuota>, QuotaRepositoryError> {
        Ok(self
            .state()
            .resellers
            .get(&reseller_id.get())
            .map(|row| ResellerQuota {
                reseller_id,
                limits: row.limits,
                usage: row.usage,
            }))
    }

    async fn recompute(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<UsageCounters>, QuotaRepositoryError> {
        Ok(self
            .state()
            .recompute(reseller_id, self.count_default_mailboxes))
    }
}

#[async_trait]
impl AliasRepository for InMemoryPanel {
    async fn find_owned_domain(
        &self,
        reseller_id: ResellerId,
        domain_id: DomainId,
    ) -> Result<Option<OwnedDomain>, AliasRepositoryError> {
        Ok(self
            .state()
            .domains
            .iter()
            .find(|domain| domain.id == domain_id && domain.reseller_id == reseller_id)
            .cloned())
    }

    async fn name_exists(&self, name: &DomainName) -> Result<bool, AliasRepositoryError> {
        Ok(self.state().name_in_use(name.as_str()))
    }

    async fn mount_point_taken(
        &self,
        domain_id: DomainId,
        mount_point: &MountPoint,
    ) -> Result<bool, AliasRepositoryError> {
        Ok(self.state().mount_in_use(domain_id, mount_point.as_str()))
    }

    async fn list_client_domains(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Vec<ClientDomains>, AliasRepositoryError> {
        let state = self.state();
        let mut clients: Vec<&ClientRow> = state
            .clients
            .iter()
            .filter(|client| client.reseller_id == reseller_id)
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.get().cmp(&b.id.get())));

        Ok(clients
            .into_iter()
            .filter_map(|client| {
                let mut domains: Vec<DomainChoice> = state
                    .domains
                    .iter()
                    .filter(|domain| domain.client_id == client.id)
                    .map(|domain| DomainChoice {
                        domain_id: domain.id,
                        domain_name: domain.name.clone(),
                    })
                    .collect();
                if domains.is_empty() {
                    return None;
                }
                domains.sort_by(|a, b| a.domain_name.cmp(&b.domain_name));
                Some(ClientDomains {
                    client_id: client.id,
                    client_name: client.name.clone(),
                    domains,
                })
            })
            .collect())
    }

    async fn insert_alias(
        &self,
        reseller_id: ResellerId,
        alias: &NewDomainAlias,
    ) -> Result<PersistedAlias, AliasRepositoryError> {
        let mut state = self.state();
        let limit = state
            .resellers
            .get(&reseller_id.get())
            .map(|row| row.limits.aliases)
            .ok_or_else(|| AliasRepositoryError::reseller_not_found(reseller_id))?;
        let before = state
            .recompute(reseller_id, self.count_default_mailboxes)
            .ok_or_else(|| AliasRepositoryError::reseller_not_found(reseller_id))?;
        if !limit.allows_another(before.aliases) {
            return Err(AliasRepositoryError::quota_exceeded(before.aliases, limit));
        }
        if state.name_in_use(alias.name.as_str()) {
            return Err(AliasRepositoryError::name_taken(alias.name.as_str()));
        }
        if alias.forward_url.is_none()
            && state.mount_in_use(alias.domain_id, alias.mount_point.as_str())
        {
            return Err(AliasRepositoryError::mount_point_taken(
                alias.mount_point.as_str(),
            ));
        }

        let stored = DomainAlias {
            id: AliasId::new(state.next_id()),
            domain_id: alias.domain_id,
            name: alias.name.clone(),
            mount_point: alias.mount_point.clone(),
            status: ItemStatus::Pending,
            ip_id: alias.ip_id,
            forward_url: alias.forward_url.clone(),
        };
        state.aliases.push(stored.clone());
        let usage = state
            .recompute(reseller_id, self.count_default_mailboxes)
            .ok_or_else(|| AliasRepositoryError::reseller_not_found(reseller_id))?;

        Ok(PersistedAlias {
            alias: stored,
            usage,
        })
    }
}

#[async_trait]
impl AuditLog for InMemoryPanel {
    async fn append(
        &self,
        actor_login: &str,
        action: &str,
    ) -> Result<AuditLogEntry, AuditLogError> {
        if self.failing_side_effects {
            return Err(AuditLogError::write("audit log offline"));
        }
        let mut state = self.state();
        let entry = AuditLogEntry {
            id: AuditLogId::new(state.next_id()),
            logged_at: Utc::now(),
            message: audit_message(actor_login, action),
        };
        state.audit.push(entry.clone());
        Ok(entry)
    }
}

#[async_trait]
impl MailboxBootstrap for InMemoryPanel {
    async fn create_default_mailboxes(
        &self,
        alias: &DomainAlias,
    ) -> Result<u32, MailboxBootstrapError> {
        if self.failing_side_effects {
            return Err(MailboxBootstrapError::write("mail storage offline"));
        }
        let mut state = self.state();
        for account in DEFAULT_MAILBOXES {
            state
                .mailboxes
                .push(format!("{account}@{}", alias.name.as_str()));
        }
        Ok(DEFAULT_MAILBOXES.len() as u32)
    }
}

#[async_trait]
impl PropagationSignal for InMemoryPanel {
    async fn request_propagation(&self) -> Result<(), PropagationError> {
        if self.failing_side_effects {
            return Err(PropagationError::unreachable("daemon offline"));
        }
        self.propagations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryPanel {
    async fn lookup(
        &self,
        query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let stored = self
            .state()
            .idempotency
            .iter()
            .find(|record| record.scope() == query.scope())
            .cloned();
        Ok(IdempotencyLookupResult::classify(stored, &query.payload_hash))
    }

    async fn store(&self, record: &IdempotencyRecord) -> Result<(), IdempotencyRepositoryError> {
        let mut state = self.state();
        let duplicate = state
            .idempotency
            .iter()
            .any(|existing| existing.scope() == record.scope());
        if duplicate {
            return Err(IdempotencyRepositoryError::duplicate_key(
                record.key.to_string(),
            ));
        }
        state.idempotency.push(record.clone());
        Ok(())
    }
}

#[async_trait]
impl ResellerOverviewRepository for InMemoryPanel {
    async fn load_overview(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<ResellerOverviewRecord>, ResellerOverviewRepositoryError> {
        let state = self.state();
        Ok(state
            .resellers
            .get(&reseller_id.get())
            .map(|row| ResellerOverviewRecord {
                account: ResellerAccount {
                    login: row.login.clone(),
                    features: ResellerFeatures {
                        support_system: true,
                        php_ini_system: false,
                        software_allowed: false,
                    },
                },
                open_tickets: 0,
                pending_orders: 0,
                ordered_aliases: state
                    .aliases
                    .iter()
                    .filter(|alias| alias.status == ItemStatus::Ordered)
                    .filter(|alias| state.reseller_of_domain(alias.domain_id) == Some(reseller_id))
                    .count() as u64,
            }))
    }
}
