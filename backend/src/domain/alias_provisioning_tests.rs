//! Tests for the alias provisioning service.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::ports::{
    AuditLogError, ForwardRequest, MailboxBootstrapError, MockAliasRepository, MockAuditLog,
    MockIdempotencyRepository, MockMailboxBootstrap, MockPropagationSignal, MockQuotaRepository,
    PropagationError,
};
use crate::domain::{
    AliasId, AuditLogEntry, AuditLogId, ClientDomains, ClientId, DomainChoice, DomainId,
    ErrorCode, ItemStatus, PersistedAlias, QuotaLimits, ResellerQuota, UsageCounters,
};

const RESELLER: ResellerId = ResellerId::new(10);
const DOMAIN: DomainId = DomainId::new(20);

struct Harness {
    quota: MockQuotaRepository,
    aliases: MockAliasRepository,
    audit: MockAuditLog,
    mailboxes: MockMailboxBootstrap,
    propagation: MockPropagationSignal,
    idempotency: MockIdempotencyRepository,
    policy: ProvisioningPolicy,
}

impl Harness {
    fn new() -> Self {
        Self {
            quota: MockQuotaRepository::new(),
            aliases: MockAliasRepository::new(),
            audit: MockAuditLog::new(),
            mailboxes: MockMailboxBootstrap::new(),
            propagation: MockPropagationSignal::new(),
            idempotency: MockIdempotencyRepository::new(),
            policy: ProvisioningPolicy {
                base_server_vhost: "panel.example.com".to_owned(),
                ..ProvisioningPolicy::default()
            },
        }
    }

    fn owns_domain(mut self) -> Self {
        self.aliases
            .expect_find_owned_domain()
            .times(1)
            .return_once(|reseller_id, domain_id| {
                Ok(Some(OwnedDomain {
                    id: domain_id,
                    name: "client.tld".to_owned(),
                    client_id: ClientId::new(30),
                    reseller_id,
                    ip_id: 5,
                }))
            });
        self
    }

    fn alias_quota(mut self, limit: QuotaLimit, current: u64) -> Self {
        self.quota
            .expect_find_quota()
            .times(1)
            .return_once(move |reseller_id| Ok(Some(quota(reseller_id, limit, current))));
        self
    }

    fn names_free(mut self, times: usize) -> Self {
        self.aliases
            .expect_name_exists()
            .times(times)
            .returning(|_| Ok(false));
        self
    }

    fn mounts_free(mut self) -> Self {
        self.aliases
            .expect_mount_point_taken()
            .times(1)
            .return_once(|_, _| Ok(false));
        self
    }

    fn inserts(mut self, alias_usage: u64) -> Self {
        self.aliases
            .expect_insert_alias()
            .times(1)
            .return_once(move |_, alias| {
                Ok(PersistedAlias {
                    alias: persisted(alias),
                    usage: UsageCounters::default().with(Resource::Alias, alias_usage),
                })
            });
        self
    }

    fn side_effects_succeed(mut self) -> Self {
        self.mailboxes
            .expect_create_default_mailboxes()
            .times(1)
            .return_once(|_| Ok(4));
        self.propagation
            .expect_request_propagation()
            .times(1)
            .return_once(|| Ok(()));
        self.audit
            .expect_append()
            .times(1)
            .return_once(|actor, action| Ok(audit_entry(actor, action)));
        self
    }

    fn nothing_written(mut self) -> Self {
        self.aliases.expect_insert_alias().times(0);
        self.mailboxes.expect_create_default_mailboxes().times(0);
        self.propagation.expect_request_propagation().times(0);
        self.audit.expect_append().times(0);
        self
    }

    fn service(mut self) -> AliasProvisioningService {
        let idempotency =
            std::mem::replace(&mut self.idempotency, MockIdempotencyRepository::new());
        self.service_with_idempotency(Arc::new(idempotency))
    }

    fn service_with_idempotency(
        self,
        idempotency: Arc<dyn IdempotencyRepository>,
    ) -> AliasProvisioningService {
        AliasProvisioningService::new(
            AliasProvisioningPorts {
                quota: Arc::new(self.quota),
                aliases: Arc::new(self.aliases),
                audit: Arc::new(self.audit),
                mailboxes: Arc::new(self.mailboxes),
                propagation: Arc::new(self.propagation),
                idempotency,
            },
            self.policy,
        )
    }
}

fn quota(reseller_id: ResellerId, limit: QuotaLimit, current: u64) -> ResellerQuota {
    ResellerQuota {
        reseller_id,
        limits: QuotaLimits::unlimited().with(Resource::Alias, limit),
        usage: UsageCounters::default().with(Resource::Alias, current),
    }
}

fn persisted(alias: &NewDomainAlias) -> DomainAlias {
    DomainAlias {
        id: AliasId::new(99),
        domain_id: alias.domain_id,
        name: alias.name.clone(),
        mount_point: alias.mount_point.clone(),
        status: ItemStatus::Pending,
        ip_id: alias.ip_id,
        forward_url: alias.forward_url.clone(),
    }
}

fn audit_entry(actor: &str, action: &str) -> AuditLogEntry {
    AuditLogEntry {
        id: AuditLogId::new(1),
        logged_at: Utc::now(),
        message: format!("{actor}: {action}"),
    }
}

fn request(name: &str, mount_point: &str) -> AliasProvisioningRequest {
    AliasProvisioningRequest {
        context: RequestContext::new(RESELLER, "reseller1"),
        domain_id: DOMAIN,
        proposed_name: name.to_owned(),
        mount_point: mount_point.to_owned(),
        forward: None,
        idempotency_key: None,
    }
}

fn forwarding_request(name: &str, target: &str) -> AliasProvisioningRequest {
    AliasProvisioningRequest {
        forward: Some(ForwardRequest {
            prefix: ForwardPrefix::Https,
            target: target.to_owned(),
        }),
        ..request(name, "/ignored")
    }
}

fn detail_code(err: &Error) -> String {
    err.details()
        .and_then(|details| details.get("code"))
        .and_then(|code| code.as_str())
        .unwrap_or_default()
        .to_owned()
}

#[tokio::test]
async fn creates_alias_and_reports_new_usage() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Limited(5), 1)
        .names_free(2)
        .mounts_free()
        .inserts(2);
    harness
        .mailboxes
        .expect_create_default_mailboxes()
        .times(1)
        .return_once(|_| Ok(4));
    harness
        .propagation
        .expect_request_propagation()
        .times(1)
        .return_once(|| Ok(()));
    harness
        .audit
        .expect_append()
        .withf(|actor, action| actor == "reseller1" && action == "add domain alias: newalias.tld")
        .times(1)
        .return_once(|actor, action| Ok(audit_entry(actor, action)));

    let created = harness
        .service()
        .create_alias(request("NewAlias.tld", "/web"))
        .await
        .expect("alias created");

    assert_eq!(created.alias_name, "newalias.tld");
    assert_eq!(created.mount_point, "/web");
    assert_eq!(created.status, ItemStatus::Pending);
    assert_eq!(created.alias_usage, 2);
    assert_eq!(created.forward_url, None);
    assert!(!created.replayed);
}

#[tokio::test]
async fn inserted_alias_copies_the_domain_ip() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free()
        .side_effects_succeed();
    harness
        .aliases
        .expect_insert_alias()
        .withf(|reseller_id, alias| {
            *reseller_id == RESELLER && alias.ip_id == 5 && alias.domain_id == DOMAIN
        })
        .times(1)
        .return_once(|_, alias| {
            Ok(PersistedAlias {
                alias: persisted(alias),
                usage: UsageCounters::default().with(Resource::Alias, 1),
            })
        });

    harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect("alias created");
}

#[tokio::test]
async fn foreign_domains_are_rejected_before_quota() {
    let mut harness = Harness::new().nothing_written();
    harness
        .aliases
        .expect_find_owned_domain()
        .times(1)
        .return_once(|_, _| Ok(None));
    harness.quota.expect_find_quota().times(0);

    let err = harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect_err("not owned");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(detail_code(&err), "domain_not_found");
}

#[rstest]
#[case(QuotaLimit::Limited(2), 2)]
#[case(QuotaLimit::Limited(2), 3)]
#[case(QuotaLimit::Disabled, 0)]
#[tokio::test]
async fn exhausted_quota_wins_over_name_errors(#[case] limit: QuotaLimit, #[case] current: u64) {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(limit, current)
        .nothing_written();
    harness.aliases.expect_name_exists().times(0);

    let err = harness
        .service()
        .create_alias(request("example..com", "/"))
        .await
        .expect_err("quota exhausted");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(detail_code(&err), "quota_exceeded");
}

#[tokio::test]
async fn disabled_quota_reports_disabled_limit() {
    let harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Disabled, 0)
        .nothing_written();

    let err = harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect_err("disabled");

    let details = err.details().expect("details");
    assert_eq!(details["limit"], json!("disabled"));
}

#[rstest]
#[case("example..com")]
#[case("-shop.tld")]
#[case("a.b.c.tld")]
#[case("")]
#[tokio::test]
async fn malformed_names_are_rejected(#[case] name: &str) {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .nothing_written();
    harness.aliases.expect_name_exists().times(0);

    let err = harness
        .service()
        .create_alias(request(name, "/"))
        .await
        .expect_err("invalid name");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(detail_code(&err), "invalid_name");
}

#[tokio::test]
async fn existing_names_conflict() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .nothing_written();
    harness
        .aliases
        .expect_name_exists()
        .times(1)
        .return_once(|_| Ok(true));

    let err = harness
        .service()
        .create_alias(request("taken.tld", "/"))
        .await
        .expect_err("name taken");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(detail_code(&err), "name_taken");
}

#[tokio::test]
async fn panel_host_is_reserved() {
    let harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(1)
        .nothing_written();

    let err = harness
        .service()
        .create_alias(request("Panel.Example.com", "/"))
        .await
        .expect_err("reserved");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(detail_code(&err), "reserved_name");
}

#[tokio::test]
async fn forwarding_aliases_mount_at_root() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(1)
        .inserts(1)
        .side_effects_succeed();
    harness.aliases.expect_mount_point_taken().times(0);

    let created = harness
        .service()
        .create_alias(forwarding_request("go.tld", "a.b.c.d.example.com"))
        .await
        .expect("forwarding alias created");

    assert_eq!(created.mount_point, "/");
    assert_eq!(
        created.forward_url.as_deref(),
        Some("https://a.b.c.d.example.com")
    );
}

#[rstest]
#[case("bad..target")]
#[case("localhost")]
#[tokio::test]
async fn invalid_forward_targets_are_rejected(#[case] target: &str) {
    let harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(1)
        .nothing_written();

    let err = harness
        .service()
        .create_alias(forwarding_request("go.tld", target))
        .await
        .expect_err("invalid target");

    assert_eq!(detail_code(&err), "invalid_forward_target");
}

#[rstest]
#[case("web")]
#[case("/htdocs")]
#[case("/web/")]
#[tokio::test]
async fn invalid_mount_points_are_rejected(#[case] mount_point: &str) {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(1)
        .nothing_written();
    harness.aliases.expect_mount_point_taken().times(0);

    let err = harness
        .service()
        .create_alias(request("shop.tld", mount_point))
        .await
        .expect_err("invalid mount point");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(detail_code(&err), "invalid_mount_point");
}

#[tokio::test]
async fn mount_collisions_conflict() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .nothing_written();
    harness
        .aliases
        .expect_mount_point_taken()
        .times(1)
        .return_once(|_, _| Ok(true));

    let err = harness
        .service()
        .create_alias(request("shop.tld", "/blog"))
        .await
        .expect_err("mount taken");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(detail_code(&err), "mount_point_taken");
}

#[tokio::test]
async fn insert_races_surface_as_taxonomy_errors() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free();
    harness
        .aliases
        .expect_insert_alias()
        .times(1)
        .return_once(|_, _| Err(AliasRepositoryError::name_taken("shop.tld")));
    harness.audit.expect_append().times(0);

    let err = harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect_err("race lost");

    assert_eq!(detail_code(&err), "name_taken");
}

#[rstest]
#[case(AliasRepositoryError::connection("refused"), ErrorCode::ServiceUnavailable)]
#[case(AliasRepositoryError::query("deadlock"), ErrorCode::InternalError)]
#[tokio::test]
async fn storage_failures_are_generic(
    #[case] failure: AliasRepositoryError,
    #[case] expected: ErrorCode,
) {
    let mut harness = Harness::new();
    harness
        .aliases
        .expect_find_owned_domain()
        .times(1)
        .return_once(move |_, _| Err(failure));

    let err = harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect_err("storage failure");

    assert_eq!(err.code(), expected);
    assert_eq!(detail_code(&err), "storage");
}

#[tokio::test]
async fn side_effect_failures_do_not_fail_creation() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free()
        .inserts(1);
    harness
        .mailboxes
        .expect_create_default_mailboxes()
        .times(1)
        .return_once(|_| Err(MailboxBootstrapError::write("disk full")));
    harness
        .propagation
        .expect_request_propagation()
        .times(1)
        .return_once(|| Err(PropagationError::unreachable("socket closed")));
    harness
        .audit
        .expect_append()
        .times(1)
        .return_once(|_, _| Err(AuditLogError::write("log table locked")));

    let created = harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect("creation survives side effects");
    assert_eq!(created.alias_usage, 1);
}

#[tokio::test]
async fn default_mailboxes_follow_the_policy() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free()
        .inserts(1);
    harness.policy.create_default_email_addresses = false;
    harness.mailboxes.expect_create_default_mailboxes().times(0);
    harness
        .propagation
        .expect_request_propagation()
        .times(1)
        .return_once(|| Ok(()));
    harness
        .audit
        .expect_append()
        .times(1)
        .return_once(|actor, action| Ok(audit_entry(actor, action)));

    harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect("alias created");
}

#[tokio::test]
async fn counted_default_mailboxes_refresh_the_ledger() {
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free()
        .inserts(1)
        .side_effects_succeed();
    harness.policy.count_default_email_addresses = true;
    harness
        .quota
        .expect_recompute()
        .times(1)
        .return_once(|_| Ok(Some(UsageCounters::default().with(Resource::Mail, 4))));

    harness
        .service()
        .create_alias(request("shop.tld", "/"))
        .await
        .expect("alias created");
}

fn stored_response() -> serde_json::Value {
    json!({
        "aliasId": 99,
        "aliasName": "shop.tld",
        "mountPoint": "/",
        "status": "pending",
        "forwardUrl": null,
        "aliasUsage": 1,
        "replayed": false,
    })
}

fn stored_record(key: &IdempotencyKey, payload_hash: PayloadHash) -> IdempotencyRecord {
    IdempotencyRecord {
        key: key.clone(),
        mutation_type: MutationType::AliasCreation,
        payload_hash,
        response_snapshot: stored_response(),
        reseller_id: RESELLER,
        created_at: Utc::now(),
    }
}

fn keyed(mut request: AliasProvisioningRequest, key: &IdempotencyKey) -> AliasProvisioningRequest {
    request.idempotency_key = Some(key.clone());
    request
}

#[tokio::test]
async fn matching_replay_returns_the_stored_response() {
    let key = IdempotencyKey::random();
    let record_key = key.clone();
    let mut harness = Harness::new().nothing_written();
    harness.aliases.expect_find_owned_domain().times(0);
    harness
        .idempotency
        .expect_lookup()
        .withf(|query| {
            query.reseller_id == RESELLER && query.mutation_type == MutationType::AliasCreation
        })
        .times(1)
        .return_once(move |query| {
            Ok(IdempotencyLookupResult::MatchingPayload(stored_record(
                &record_key,
                query.payload_hash.clone(),
            )))
        });
    harness.idempotency.expect_store().times(0);

    let created = harness
        .service()
        .create_alias(keyed(request("shop.tld", "/"), &key))
        .await
        .expect("replayed");

    assert!(created.replayed);
    assert_eq!(created.alias_id, AliasId::new(99));
}

#[tokio::test]
async fn reused_key_with_other_payload_conflicts() {
    let key = IdempotencyKey::random();
    let record_key = key.clone();
    let mut harness = Harness::new().nothing_written();
    harness
        .idempotency
        .expect_lookup()
        .times(1)
        .return_once(move |query| {
            Ok(IdempotencyLookupResult::ConflictingPayload(stored_record(
                &record_key,
                query.payload_hash.clone(),
            )))
        });

    let err = harness
        .service()
        .create_alias(keyed(request("other.tld", "/"), &key))
        .await
        .expect_err("conflict");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(detail_code(&err), "idempotency_conflict");
}

#[tokio::test]
async fn first_keyed_request_stores_its_response() {
    let key = IdempotencyKey::random();
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free()
        .inserts(1)
        .side_effects_succeed();
    harness
        .idempotency
        .expect_lookup()
        .times(1)
        .return_once(|_| Ok(IdempotencyLookupResult::NotFound));
    harness
        .idempotency
        .expect_store()
        .withf(|record| {
            record.response_snapshot["aliasName"] == "shop.tld"
                && record.response_snapshot["replayed"] == false
        })
        .times(1)
        .return_once(|_| Ok(()));

    let created = harness
        .service()
        .create_alias(keyed(request("shop.tld", "/"), &key))
        .await
        .expect("created");
    assert!(!created.replayed);
}

#[tokio::test]
async fn store_race_replays_the_winner() {
    let key = IdempotencyKey::random();
    let record_key = key.clone();
    let mut harness = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free()
        .inserts(1)
        .side_effects_succeed();
    let mut lookups = 0;
    harness
        .idempotency
        .expect_lookup()
        .times(2)
        .returning(move |query| {
            lookups += 1;
            if lookups == 1 {
                Ok(IdempotencyLookupResult::NotFound)
            } else {
                Ok(IdempotencyLookupResult::MatchingPayload(stored_record(
                    &record_key,
                    query.payload_hash.clone(),
                )))
            }
        });
    harness
        .idempotency
        .expect_store()
        .times(1)
        .return_once(|_| Err(IdempotencyRepositoryError::duplicate_key("winner exists")));

    let created = harness
        .service()
        .create_alias(keyed(request("shop.tld", "/"), &key))
        .await
        .expect("winner replayed");
    assert!(created.replayed);
}

fn client_domains() -> Vec<ClientDomains> {
    vec![ClientDomains {
        client_id: ClientId::new(30),
        client_name: "client1".to_owned(),
        domains: vec![DomainChoice {
            domain_id: DOMAIN,
            domain_name: "client.tld".to_owned(),
        }],
    }]
}

#[tokio::test]
async fn alias_form_lists_clients_and_prefixes() {
    let mut harness = Harness::new().alias_quota(QuotaLimit::Limited(3), 1);
    harness
        .aliases
        .expect_list_client_domains()
        .times(1)
        .return_once(|_| Ok(client_domains()));

    let form = harness
        .service()
        .alias_form(&RequestContext::new(RESELLER, "reseller1"))
        .await
        .expect("form");

    assert_eq!(form.clients, client_domains());
    assert_eq!(form.alias_quota.current, 1);
    assert_eq!(form.forward_prefixes, ForwardPrefix::ALL.to_vec());
}

#[rstest]
#[case(QuotaLimit::Disabled, 0, "aliases_disabled")]
#[case(QuotaLimit::Limited(1), 1, "quota_exceeded")]
#[tokio::test]
async fn alias_form_is_refused_without_quota(
    #[case] limit: QuotaLimit,
    #[case] current: u64,
    #[case] code: &str,
) {
    let mut harness = Harness::new().alias_quota(limit, current);
    harness.aliases.expect_list_client_domains().times(0);

    let err = harness
        .service()
        .alias_form(&RequestContext::new(RESELLER, "reseller1"))
        .await
        .expect_err("refused");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert_eq!(detail_code(&err), code);
}

#[tokio::test]
async fn alias_form_needs_clients() {
    let mut harness = Harness::new().alias_quota(QuotaLimit::Unlimited, 0);
    harness
        .aliases
        .expect_list_client_domains()
        .times(1)
        .return_once(|_| Ok(Vec::new()));

    let err = harness
        .service()
        .alias_form(&RequestContext::new(RESELLER, "reseller1"))
        .await
        .expect_err("no clients");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(detail_code(&err), "no_clients");
}

/// Idempotency store whose writes take a while to land.
#[derive(Default)]
struct SlowIdempotency {
    stored: Mutex<Vec<IdempotencyRecord>>,
}

#[async_trait]
impl IdempotencyRepository for SlowIdempotency {
    async fn lookup(
        &self,
        _query: &IdempotencyLookupQuery,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        Ok(IdempotencyLookupResult::NotFound)
    }

    async fn store(&self, record: &IdempotencyRecord) -> Result<(), IdempotencyRepositoryError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        self.stored.lock().expect("stored records").push(record.clone());
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn record_is_stored_when_the_deadline_fires_after_commit() {
    let key = IdempotencyKey::random();
    let idempotency = Arc::new(SlowIdempotency::default());
    let service = Harness::new()
        .owns_domain()
        .alias_quota(QuotaLimit::Unlimited, 0)
        .names_free(2)
        .mounts_free()
        .inserts(1)
        .side_effects_succeed()
        .service_with_idempotency(idempotency.clone());

    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        service.create_alias(keyed(request("shop.tld", "/"), &key)),
    )
    .await;
    assert!(outcome.is_err(), "deadline should fire while storing");

    tokio::time::sleep(Duration::from_secs(10)).await;
    let stored = idempotency.stored.lock().expect("stored records");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].key, key);
    assert_eq!(stored[0].response_snapshot["aliasName"], "shop.tld");
}
