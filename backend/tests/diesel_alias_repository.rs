//! Integration tests for the Diesel alias adapters against embedded PostgreSQL.
//!
//! Covers the insert transaction (quota, name and mount re-checks plus the
//! ledger recompute), ownership lookups, the client/domain form data and
//! full provisioning runs with audit and default mailboxes.

use std::sync::Arc;

use panel::domain::ports::{
    AliasProvisioner, AliasProvisioningRequest, AliasRepository, AliasRepositoryError,
    LoginService, QuotaRepository,
};
use panel::domain::{
    AliasProvisioningPorts, AliasProvisioningService, DomainId, DomainName, ErrorCode, ItemStatus,
    LabelRule, LoginCredentials, MountPoint, NewDomainAlias, ProvisioningPolicy, QuotaLimit,
    RequestContext, ResellerId, Resource, UsageCounters,
};
use panel::outbound::persistence::{
    DbPool, DieselAliasRepository, DieselAuditLog, DieselIdempotencyRepository,
    DieselLoginService, DieselMailboxBootstrap, DieselQuotaRepository, PoolConfig,
};
use panel::outbound::propagation::LoggingPropagationSignal;
use pg_embedded_setup_unpriv::TestCluster;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

mod support;

use support::pg_embed::test_cluster;
use support::{
    SeededPanel, count_rows, handle_cluster_setup_failure, reset_database, seed_panel,
    seeded_usage,
};

const TEST_DB: &str = "diesel_alias_repository_test";
const ALIAS_LIMIT: i64 = 1;

struct TestContext {
    runtime: Runtime,
    _cluster: TestCluster,
    url: String,
    pool: DbPool,
    seeded: SeededPanel,
}

impl TestContext {
    fn reseller(&self) -> ResellerId {
        ResellerId::new(self.seeded.reseller_id)
    }

    fn domain(&self) -> DomainId {
        DomainId::new(self.seeded.domain_id)
    }

    fn repository(&self) -> DieselAliasRepository {
        DieselAliasRepository::new(self.pool.clone())
    }

    fn quota_repository(&self) -> DieselQuotaRepository {
        DieselQuotaRepository::new(self.pool.clone())
    }

    fn provisioning_service(&self, policy: ProvisioningPolicy) -> AliasProvisioningService {
        let counted = policy.count_default_email_addresses;
        AliasProvisioningService::new(
            AliasProvisioningPorts {
                quota: Arc::new(self.quota_repository().with_default_mailboxes_counted(counted)),
                aliases: Arc::new(self.repository().with_default_mailboxes_counted(counted)),
                audit: Arc::new(DieselAuditLog::new(self.pool.clone())),
                mailboxes: Arc::new(DieselMailboxBootstrap::new(self.pool.clone())),
                propagation: Arc::new(LoggingPropagationSignal::new()),
                idempotency: Arc::new(DieselIdempotencyRepository::new(self.pool.clone())),
            },
            policy,
        )
    }

    fn cached_usage(&self) -> UsageCounters {
        self.runtime
            .block_on(self.quota_repository().find_quota(self.reseller()))
            .expect("quota lookup")
            .expect("reseller quota")
            .usage
    }
}

fn request(ctx: &TestContext, name: &str, mount: &str) -> AliasProvisioningRequest {
    AliasProvisioningRequest {
        context: RequestContext::new(ctx.reseller(), support::RESELLER_LOGIN),
        domain_id: ctx.domain(),
        proposed_name: name.to_owned(),
        mount_point: mount.to_owned(),
        forward: None,
        idempotency_key: None,
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let url = reset_database(&cluster, TEST_DB)?;
    let seeded = seed_panel(&url, ALIAS_LIMIT)?;

    let config = PoolConfig::new(&url).with_max_size(2).with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        _cluster: cluster,
        url,
        pool,
        seeded,
    })
}

#[fixture]
fn context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn new_alias(domain_id: DomainId, name: &str, mount: &str) -> NewDomainAlias {
    NewDomainAlias {
        domain_id,
        name: DomainName::parse(name, LabelRule::Strict { max_labels: 3 }).expect("valid name"),
        mount_point: MountPoint::parse(mount).expect("valid mount"),
        ip_id: 1,
        forward_url: None,
    }
}

#[rstest]
fn insert_records_pending_alias_and_recomputes_counters(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let repo = ctx.repository();

    let persisted = ctx
        .runtime
        .block_on(repo.insert_alias(ctx.reseller(), &new_alias(ctx.domain(), "shop.org", "/shop")))
        .expect("insert alias");

    assert_eq!(persisted.alias.status, ItemStatus::Pending);
    assert_eq!(persisted.usage, seeded_usage().with(Resource::Alias, 1));

    let stored = count_rows(
        &ctx.url,
        "SELECT COUNT(*) FROM domain_aliasses WHERE alias_name = $1 AND alias_status = 'toadd'",
        "shop.org",
    )
    .expect("count aliases");
    assert_eq!(stored, 1);

    let quota = ctx
        .runtime
        .block_on(ctx.quota_repository().find_quota(ctx.reseller()))
        .expect("quota lookup")
        .expect("reseller quota");
    assert_eq!(quota.usage.get(Resource::Alias), 1);
    assert_eq!(quota.limits.get(Resource::Alias), QuotaLimit::Limited(1));
}

#[rstest]
fn mount_points_are_scoped_to_the_owning_domain(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let repo = ctx.repository();

    let err = ctx
        .runtime
        .block_on(repo.insert_alias(ctx.reseller(), &new_alias(ctx.domain(), "blog.net", "/blog")))
        .expect_err("mount used by a subdomain of the same domain");
    assert!(matches!(err, AliasRepositoryError::MountPointTaken { .. }));

    let second = DomainId::new(ctx.seeded.second_domain_id);
    let persisted = ctx
        .runtime
        .block_on(repo.insert_alias(ctx.reseller(), &new_alias(second, "blog.net", "/blog")))
        .expect("another domain may reuse the mount point");
    assert_eq!(persisted.alias.domain_id, second);
    assert_eq!(persisted.alias.mount_point.as_str(), "/blog");
}

#[rstest]
fn insert_rejects_when_quota_is_exhausted(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let repo = ctx.repository();
    ctx.runtime
        .block_on(repo.insert_alias(ctx.reseller(), &new_alias(ctx.domain(), "one.org", "/one")))
        .expect("first alias");

    let err = ctx
        .runtime
        .block_on(repo.insert_alias(ctx.reseller(), &new_alias(ctx.domain(), "two.org", "/two")))
        .expect_err("quota reached");

    assert!(matches!(
        err,
        AliasRepositoryError::QuotaExceeded {
            current: 1,
            limit: QuotaLimit::Limited(1)
        }
    ));
}

#[rstest]
#[case("other.org", "/fresh")]
#[case("example.org", "/fresh")]
fn insert_rejects_names_used_by_domains(
    context: Option<TestContext>,
    #[case] name: &str,
    #[case] mount: &str,
) {
    let Some(ctx) = context else {
        return;
    };
    let err = ctx
        .runtime
        .block_on(
            ctx.repository()
                .insert_alias(ctx.reseller(), &new_alias(ctx.domain(), name, mount)),
        )
        .expect_err("name in use");
    assert!(matches!(err, AliasRepositoryError::NameTaken { .. }));
}

#[rstest]
fn insert_rejects_taken_mount_points_unless_forwarding(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let repo = ctx.repository();

    let err = ctx
        .runtime
        .block_on(repo.insert_alias(ctx.reseller(), &new_alias(ctx.domain(), "blog.net", "/blog")))
        .expect_err("mount in use");
    assert!(matches!(err, AliasRepositoryError::MountPointTaken { .. }));

    let forwarding = NewDomainAlias {
        forward_url: Some("https://example.com".to_owned()),
        ..new_alias(ctx.domain(), "blog.net", "/")
    };
    let persisted = ctx
        .runtime
        .block_on(repo.insert_alias(ctx.reseller(), &forwarding))
        .expect("forwarding alias skips the mount check");
    assert_eq!(
        persisted.alias.forward_url.as_deref(),
        Some("https://example.com")
    );
}

#[rstest]
fn ownership_is_scoped_to_the_reseller(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let repo = ctx.repository();

    let own = ctx
        .runtime
        .block_on(repo.find_owned_domain(ctx.reseller(), ctx.domain()))
        .expect("lookup");
    assert_eq!(own.map(|domain| domain.name), Some("example.org".to_owned()));

    let foreign = ctx
        .runtime
        .block_on(repo.find_owned_domain(
            ctx.reseller(),
            DomainId::new(ctx.seeded.other_reseller_domain_id),
        ))
        .expect("lookup");
    assert!(foreign.is_none());

    let clients = ctx
        .runtime
        .block_on(repo.list_client_domains(ctx.reseller()))
        .expect("client domains");
    assert_eq!(clients.len(), 1);
    assert_eq!(clients[0].client_name, "alice");
    assert_eq!(clients[0].domains[0].domain_name, "example.org");
    assert_eq!(clients[0].domains[1].domain_name, "second.org");
}

#[rstest]
fn provisioning_writes_audit_entry_and_default_mailboxes(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let service = ctx.provisioning_service(ProvisioningPolicy::default());

    let created = ctx
        .runtime
        .block_on(service.create_alias(request(&ctx, "Shop.Org", "/shop")))
        .expect("alias created");

    assert_eq!(created.alias_name, "shop.org");
    assert_eq!(created.alias_usage, 1);

    let audit = count_rows(
        &ctx.url,
        "SELECT COUNT(*) FROM log WHERE log_message LIKE $1",
        "reseller1: add domain alias: shop.org%",
    )
    .expect("count audit rows");
    assert_eq!(audit, 1);

    let mailboxes = count_rows(
        &ctx.url,
        "SELECT COUNT(*) FROM mail_users WHERE mail_addr LIKE $1",
        "%@shop.org",
    )
    .expect("count mailboxes");
    assert_eq!(mailboxes, 4);
}

#[rstest]
fn login_accepts_resellers_only(context: Option<TestContext>) {
    let Some(ctx) = context else {
        return;
    };
    let login = DieselLoginService::new(ctx.pool.clone());

    let credentials =
        LoginCredentials::try_from_parts(support::RESELLER_LOGIN, support::RESELLER_PASSWORD)
            .expect("credentials");
    let session = ctx
        .runtime
        .block_on(login.authenticate(&credentials))
        .expect("reseller login");
    assert_eq!(session.reseller_id, ctx.reseller());

    let client = LoginCredentials::try_from_parts("alice", support::RESELLER_PASSWORD)
        .expect("credentials");
    let err = ctx
        .runtime
        .block_on(login.authenticate(&client))
        .expect_err("clients cannot log in");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[case::default_mailboxes_uncounted(ProvisioningPolicy::default())]
#[case::without_default_mailboxes(ProvisioningPolicy {
    create_default_email_addresses: false,
    ..ProvisioningPolicy::default()
})]
fn provisioning_changes_only_the_alias_counter(
    context: Option<TestContext>,
    #[case] policy: ProvisioningPolicy,
) {
    let Some(ctx) = context else {
        return;
    };
    let before = ctx
        .runtime
        .block_on(ctx.quota_repository().recompute(ctx.reseller()))
        .expect("recompute")
        .expect("reseller quota");
    assert_eq!(before, seeded_usage());

    let created = ctx
        .runtime
        .block_on(
            ctx.provisioning_service(policy)
                .create_alias(request(&ctx, "shop.org", "/shop")),
        )
        .expect("alias created");

    let expected = before.with(Resource::Alias, before.aliases + 1);
    assert_eq!(created.alias_usage, expected.aliases);
    assert_eq!(ctx.cached_usage(), expected);
    let recounted = ctx
        .runtime
        .block_on(ctx.quota_repository().recompute(ctx.reseller()))
        .expect("recompute")
        .expect("reseller quota");
    assert_eq!(recounted, expected);
}
