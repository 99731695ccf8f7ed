//! Builders wiring driven adapters into the HTTP state.
//!
//! With a database pool every port is Diesel-backed; without one the panel
//! runs on fixtures so it can start for local development.

use std::sync::Arc;

use actix_web::web;

use panel::domain::ports::{
    AliasRepository, AuditLog, FixtureAliasRepository, FixtureAuditLog,
    FixtureIdempotencyRepository, FixtureLoginService, FixtureMailboxBootstrap,
    FixtureQuotaRepository, FixtureResellerOverviewRepository, IdempotencyRepository,
    LoginService, MailboxBootstrap, QuotaRepository, ResellerOverviewRepository,
};
use panel::domain::{
    AliasProvisioningPorts, AliasProvisioningService, ProvisioningPolicy, QuotaLedgerService,
    ResellerOverviewService,
};
use panel::inbound::http::state::{HttpState, HttpStatePorts};
use panel::outbound::persistence::{
    DbPool, DieselAliasRepository, DieselAuditLog, DieselIdempotencyRepository,
    DieselLoginService, DieselMailboxBootstrap, DieselQuotaRepository,
    DieselResellerOverviewRepository,
};
use panel::outbound::propagation::LoggingPropagationSignal;

use super::ServerConfig;

/// Driven adapters for one backing store.
struct DrivenAdapters<Q, O> {
    login: Arc<dyn LoginService>,
    quota: Arc<Q>,
    overview: Arc<O>,
    aliases: Arc<dyn AliasRepository>,
    audit: Arc<dyn AuditLog>,
    mailboxes: Arc<dyn MailboxBootstrap>,
    idempotency: Arc<dyn IdempotencyRepository>,
}

fn diesel_adapters(
    pool: &DbPool,
    policy: &ProvisioningPolicy,
) -> DrivenAdapters<DieselQuotaRepository, DieselResellerOverviewRepository> {
    let counted = policy.count_default_email_addresses;
    DrivenAdapters {
        login: Arc::new(DieselLoginService::new(pool.clone())),
        quota: Arc::new(
            DieselQuotaRepository::new(pool.clone()).with_default_mailboxes_counted(counted),
        ),
        overview: Arc::new(DieselResellerOverviewRepository::new(pool.clone())),
        aliases: Arc::new(
            DieselAliasRepository::new(pool.clone()).with_default_mailboxes_counted(counted),
        ),
        audit: Arc::new(DieselAuditLog::new(pool.clone())),
        mailboxes: Arc::new(DieselMailboxBootstrap::new(pool.clone())),
        idempotency: Arc::new(DieselIdempotencyRepository::new(pool.clone())),
    }
}

fn fixture_adapters() -> DrivenAdapters<FixtureQuotaRepository, FixtureResellerOverviewRepository>
{
    DrivenAdapters {
        login: Arc::new(FixtureLoginService),
        quota: Arc::new(FixtureQuotaRepository),
        overview: Arc::new(FixtureResellerOverviewRepository),
        aliases: Arc::new(FixtureAliasRepository),
        audit: Arc::new(FixtureAuditLog),
        mailboxes: Arc::new(FixtureMailboxBootstrap),
        idempotency: Arc::new(FixtureIdempotencyRepository),
    }
}

fn assemble<Q, O>(adapters: DrivenAdapters<Q, O>, policy: ProvisioningPolicy) -> HttpStatePorts
where
    Q: QuotaRepository + 'static,
    O: ResellerOverviewRepository + 'static,
{
    let DrivenAdapters {
        login,
        quota,
        overview,
        aliases,
        audit,
        mailboxes,
        idempotency,
    } = adapters;

    let provisioner = Arc::new(AliasProvisioningService::new(
        AliasProvisioningPorts {
            quota: quota.clone(),
            aliases,
            audit,
            mailboxes,
            propagation: Arc::new(LoggingPropagationSignal::new()),
            idempotency,
        },
        policy,
    ));

    HttpStatePorts {
        login,
        quota: Arc::new(QuotaLedgerService::new(quota.clone())),
        aliases: provisioner.clone(),
        alias_form: provisioner,
        overview: Arc::new(ResellerOverviewService::new(overview, quota)),
    }
}

/// Build the shared HTTP state for the configured backing store.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let policy = config.policy.clone();
    let ports = match &config.db_pool {
        Some(pool) => assemble(diesel_adapters(pool, &policy), policy),
        None => assemble(fixture_adapters(), policy),
    };
    web::Data::new(HttpState::new(ports).with_request_timeout(config.request_timeout))
}
