//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`QuotaLedger`, `AliasProvisioner`, `AliasFormQuery`,
//! `ResellerOverviewQuery`, `LoginService`) are called by inbound adapters.
//! Driven ports are implemented by outbound adapters and return their own
//! `thiserror` enums generated with `define_port_error!`.

mod macros;
pub(crate) use macros::define_port_error;

mod alias_provisioner;
mod alias_repository;
mod audit_log;
mod idempotency_repository;
mod login_service;
mod mailbox_bootstrap;
mod propagation_signal;
mod quota_ledger;
mod quota_repository;
mod reseller_overview_query;
mod reseller_overview_repository;

pub use alias_provisioner::{
    AliasCreated, AliasForm, AliasFormQuery, AliasProvisioner, AliasProvisioningRequest,
    ForwardRequest,
};
#[cfg(test)]
pub use alias_provisioner::{MockAliasFormQuery, MockAliasProvisioner};
#[cfg(test)]
pub use alias_repository::MockAliasRepository;
pub use alias_repository::{AliasRepository, AliasRepositoryError, FixtureAliasRepository};
#[cfg(test)]
pub use audit_log::MockAuditLog;
pub use audit_log::{AuditLog, AuditLogError, FixtureAuditLog};
#[cfg(test)]
pub use idempotency_repository::MockIdempotencyRepository;
pub use idempotency_repository::{
    FixtureIdempotencyRepository, IdempotencyRepository, IdempotencyRepositoryError,
};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{FixtureLoginService, LoginService};
#[cfg(test)]
pub use mailbox_bootstrap::MockMailboxBootstrap;
pub use mailbox_bootstrap::{
    DEFAULT_MAILBOXES, FixtureMailboxBootstrap, MailboxBootstrap, MailboxBootstrapError,
};
#[cfg(test)]
pub use propagation_signal::MockPropagationSignal;
pub use propagation_signal::{PropagationError, PropagationSignal};
#[cfg(test)]
pub use quota_ledger::MockQuotaLedger;
pub use quota_ledger::QuotaLedger;
#[cfg(test)]
pub use quota_repository::MockQuotaRepository;
pub use quota_repository::{FixtureQuotaRepository, QuotaRepository, QuotaRepositoryError};
#[cfg(test)]
pub use reseller_overview_query::MockResellerOverviewQuery;
pub use reseller_overview_query::ResellerOverviewQuery;
#[cfg(test)]
pub use reseller_overview_repository::MockResellerOverviewRepository;
pub use reseller_overview_repository::{
    FixtureResellerOverviewRepository, ResellerOverviewRepository,
    ResellerOverviewRepositoryError,
};
