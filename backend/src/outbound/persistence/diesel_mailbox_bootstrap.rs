//! PostgreSQL-backed `MailboxBootstrap`.
//!
//! Creates the default forward mailboxes of a new alias. Each mailbox
//! forwards to the email address of the client owning the alias' domain and
//! is flagged `is_default` so the ledger can leave it out of the mail count.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DEFAULT_MAILBOXES, MailboxBootstrap, MailboxBootstrapError};
use crate::domain::{DomainAlias, ItemStatus};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::NewMailUserRow;
use super::pool::{DbPool, PoolError};
use super::schema::{admin, domain, mail_users};

/// Mail type of a forward-only mailbox on a domain alias.
const ALIAS_FORWARD_MAIL_TYPE: &str = "alias_forward";

#[derive(Clone)]
pub struct DieselMailboxBootstrap {
    pool: DbPool,
}

impl DieselMailboxBootstrap {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MailboxBootstrapError {
    map_basic_pool_error(error, MailboxBootstrapError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> MailboxBootstrapError {
    map_basic_diesel_error(
        error,
        MailboxBootstrapError::write,
        MailboxBootstrapError::connection,
    )
}

fn mailbox_rows<'a>(alias: &DomainAlias, forward_to: &'a str) -> Vec<NewMailUserRow<'a>> {
    DEFAULT_MAILBOXES
        .iter()
        .copied()
        .map(|account| NewMailUserRow {
            domain_id: alias.domain_id.get(),
            sub_id: alias.id.get(),
            mail_acc: account,
            mail_addr: format!("{account}@{}", alias.name),
            mail_type: ALIAS_FORWARD_MAIL_TYPE,
            mail_forward: forward_to,
            status: ItemStatus::Pending.as_str(),
            is_default: true,
        })
        .collect()
}

#[async_trait]
impl MailboxBootstrap for DieselMailboxBootstrap {
    async fn create_default_mailboxes(
        &self,
        alias: &DomainAlias,
    ) -> Result<u32, MailboxBootstrapError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let forward_to: Option<String> = domain::table
            .inner_join(admin::table.on(admin::admin_id.eq(domain::domain_admin_id)))
            .filter(domain::domain_id.eq(alias.domain_id.get()))
            .select(admin::email)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let forward_to = forward_to.ok_or_else(|| {
            MailboxBootstrapError::write(format!("domain {} has no owner", alias.domain_id))
        })?;

        let rows = mailbox_rows(alias, &forward_to);
        let inserted = diesel::insert_into(mail_users::table)
            .values(&rows)
            .on_conflict(mail_users::mail_addr)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(u32::try_from(inserted).unwrap_or(u32::MAX))
    }
}
