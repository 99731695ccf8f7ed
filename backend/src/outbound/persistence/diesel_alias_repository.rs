//! PostgreSQL-backed `AliasRepository` implementation.
//!
//! `insert_alias` runs in one transaction that locks the reseller's
//! `reseller_props` row with `SELECT ... FOR UPDATE`. Concurrent creations
//! for the same reseller therefore serialise, and the quota, name and mount
//! point checks are repeated under the lock before the insert. The ledger
//! counters are recomputed before commit.

use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{AliasRepository, AliasRepositoryError};
use crate::domain::{
    AliasId, ClientDomains, ClientId, DomainAlias, DomainChoice, DomainId, DomainName,
    ItemStatus, MountPoint, NewDomainAlias, OwnedDomain, PersistedAlias, QuotaLimit, ResellerId,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{ClientRow, DomainRow, NewAliasRow, ResellerPropsRow};
use super::pool::{DbPool, PoolError};
use super::schema::{admin, domain, domain_aliasses, reseller_props, subdomain, subdomain_alias};
use super::usage_ledger::recompute_usage;

/// Stored in `url_forward` when the alias serves its own content.
const NO_FORWARD: &str = "no";

/// Diesel-backed alias storage and collision checks.
#[derive(Clone)]
pub struct DieselAliasRepository {
    pool: DbPool,
    count_default_mailboxes: bool,
}

impl DieselAliasRepository {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            count_default_mailboxes: false,
        }
    }

    /// Count the default alias mailboxes towards the mail quota when the
    /// ledger is recomputed after an insert.
    pub fn with_default_mailboxes_counted(mut self, counted: bool) -> Self {
        self.count_default_mailboxes = counted;
        self
    }
}

fn map_pool_error(error: PoolError) -> AliasRepositoryError {
    map_basic_pool_error(error, AliasRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AliasRepositoryError {
    map_basic_diesel_error(
        error,
        AliasRepositoryError::query,
        AliasRepositoryError::connection,
    )
}

/// Failure inside the insert transaction.
#[derive(Debug)]
enum InsertError {
    Diesel(diesel::result::Error),
    Rejected(AliasRepositoryError),
}

impl From<diesel::result::Error> for InsertError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_insert_error(error: InsertError, alias_name: &str) -> AliasRepositoryError {
    match error {
        InsertError::Rejected(rejection) => rejection,
        // The unique index on alias_name lost a race with another reseller.
        InsertError::Diesel(err) if is_unique_violation(&err) => {
            AliasRepositoryError::name_taken(alias_name)
        }
        InsertError::Diesel(err) => map_diesel_error(err),
    }
}

async fn name_in_use(
    conn: &mut AsyncPgConnection,
    name: &str,
) -> Result<bool, diesel::result::Error> {
    let as_domain: bool = diesel::select(exists(
        domain::table.filter(domain::domain_name.eq(name)),
    ))
    .get_result(conn)
    .await?;
    if as_domain {
        return Ok(true);
    }
    diesel::select(exists(
        domain_aliasses::table.filter(domain_aliasses::alias_name.eq(name)),
    ))
    .get_result(conn)
    .await
}

/// Mount points of the domain's subdomains and of the subdomain aliases
/// under the domain's aliases.
async fn mount_in_use(
    conn: &mut AsyncPgConnection,
    domain_id: i64,
    mount_point: &str,
) -> Result<bool, diesel::result::Error> {
    let by_subdomain: bool = diesel::select(exists(
        subdomain::table.filter(
            subdomain::domain_id
                .eq(domain_id)
                .and(subdomain::subdomain_mount.eq(mount_point)),
        ),
    ))
    .get_result(conn)
    .await?;
    if by_subdomain {
        return Ok(true);
    }

    let alias_ids = domain_aliasses::table
        .filter(domain_aliasses::domain_id.eq(domain_id))
        .select(domain_aliasses::alias_id);
    diesel::select(exists(
        subdomain_alias::table.filter(
            subdomain_alias::alias_id
                .eq_any(alias_ids)
                .and(subdomain_alias::subdomain_alias_mount.eq(mount_point)),
        ),
    ))
    .get_result(conn)
    .await
}

async fn insert_locked(
    conn: &mut AsyncPgConnection,
    reseller_id: ResellerId,
    alias: &NewDomainAlias,
    count_default_mailboxes: bool,
) -> Result<PersistedAlias, InsertError> {
    let props: Option<ResellerPropsRow> = reseller_props::table
        .filter(reseller_props::reseller_id.eq(reseller_id.get()))
        .select(ResellerPropsRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?;
    let props = props.ok_or(InsertError::Rejected(
        AliasRepositoryError::reseller_not_found(reseller_id),
    ))?;
    let limit = QuotaLimit::from_raw(props.max_als_cnt)
        .map_err(|err| InsertError::Rejected(AliasRepositoryError::query(err.to_string())))?;

    let before = recompute_usage(conn, reseller_id, count_default_mailboxes)
        .await?
        .ok_or(InsertError::Rejected(
            AliasRepositoryError::reseller_not_found(reseller_id),
        ))?
        .into_counters()
        .map_err(|message| InsertError::Rejected(AliasRepositoryError::query(message)))?;
    if !limit.allows_another(before.aliases) {
        return Err(InsertError::Rejected(AliasRepositoryError::quota_exceeded(
            before.aliases,
            limit,
        )));
    }

    if name_in_use(conn, alias.name.as_str()).await? {
        return Err(InsertError::Rejected(AliasRepositoryError::name_taken(
            alias.name.as_str(),
        )));
    }
    if alias.forward_url.is_none()
        && mount_in_use(conn, alias.domain_id.get(), alias.mount_point.as_str()).await?
    {
        return Err(InsertError::Rejected(
            AliasRepositoryError::mount_point_taken(alias.mount_point.as_str()),
        ));
    }

    let status = ItemStatus::Pending;
    let row = NewAliasRow {
        domain_id: alias.domain_id.get(),
        alias_name: alias.name.as_str(),
        alias_mount: alias.mount_point.as_str(),
        alias_status: status.as_str(),
        alias_ip_id: alias.ip_id,
        url_forward: alias.forward_url.as_deref().unwrap_or(NO_FORWARD),
    };
    let alias_id: i64 = diesel::insert_into(domain_aliasses::table)
        .values(&row)
        .returning(domain_aliasses::alias_id)
        .get_result(conn)
        .await?;

    let usage = recompute_usage(conn, reseller_id, count_default_mailboxes)
        .await?
        .ok_or(InsertError::Rejected(
            AliasRepositoryError::reseller_not_found(reseller_id),
        ))?
        .into_counters()
        .map_err(|message| InsertError::Rejected(AliasRepositoryError::query(message)))?;

    Ok(PersistedAlias {
        alias: DomainAlias {
            id: AliasId::new(alias_id),
            domain_id: alias.domain_id,
            name: alias.name.clone(),
            mount_point: alias.mount_point.clone(),
            status,
            ip_id: alias.ip_id,
            forward_url: alias.forward_url.clone(),
        },
        usage,
    })
}

fn group_client_domains(clients: Vec<ClientRow>, domains: Vec<DomainRow>) -> Vec<ClientDomains> {
    let mut by_client: BTreeMap<i64, Vec<DomainChoice>> = BTreeMap::new();
    for row in domains {
        by_client
            .entry(row.domain_admin_id)
            .or_default()
            .push(DomainChoice {
                domain_id: DomainId::new(row.domain_id),
                domain_name: row.domain_name,
            });
    }

    clients
        .into_iter()
        .filter_map(|client| {
            let domains = by_client.remove(&client.admin_id)?;
            Some(ClientDomains {
                client_id: ClientId::new(client.admin_id),
                client_name: client.admin_name,
                domains,
            })
        })
        .collect()
}

#[async_trait]
impl AliasRepository for DieselAliasRepository {
    async fn find_owned_domain(
        &self,
        reseller_id: ResellerId,
        domain_id: DomainId,
    ) -> Result<Option<OwnedDomain>, AliasRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<DomainRow> = domain::table
            .filter(
                domain::domain_id
                    .eq(domain_id.get())
                    .and(domain::domain_created_id.eq(reseller_id.get())),
            )
            .select(DomainRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(OwnedDomain::from))
    }

    async fn name_exists(&self, name: &DomainName) -> Result<bool, AliasRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        name_in_use(&mut conn, name.as_str())
            .await
            .map_err(map_diesel_error)
    }

    async fn mount_point_taken(
        &self,
        domain_id: DomainId,
        mount_point: &MountPoint,
    ) -> Result<bool, AliasRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        mount_in_use(&mut conn, domain_id.get(), mount_point.as_str())
            .await
            .map_err(map_diesel_error)
    }

    async fn list_client_domains(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Vec<ClientDomains>, AliasRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let clients: Vec<ClientRow> = admin::table
            .filter(
                admin::admin_type
                    .eq("user")
                    .and(admin::created_by.eq(reseller_id.get())),
            )
            .select(ClientRow::as_select())
            .order_by((admin::admin_name.asc(), admin::admin_id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if clients.is_empty() {
            return Ok(Vec::new());
        }

        let client_ids: Vec<i64> = clients.iter().map(|client| client.admin_id).collect();
        let domains: Vec<DomainRow> = domain::table
            .filter(
                domain::domain_admin_id
                    .eq_any(&client_ids)
                    .and(domain::domain_created_id.eq(reseller_id.get())),
            )
            .select(DomainRow::as_select())
            .order_by(domain::domain_name.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(group_client_domains(clients, domains))
    }

    async fn insert_alias(
        &self,
        reseller_id: ResellerId,
        alias: &NewDomainAlias,
    ) -> Result<PersistedAlias, AliasRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count_default_mailboxes = self.count_default_mailboxes;

        conn.transaction(|conn| {
            async move { insert_locked(conn, reseller_id, alias, count_default_mailboxes).await }
                .scope_boxed()
        })
        .await
        .map_err(|err| map_insert_error(err, alias.name.as_str()))
    }
}
