//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types live next to
//! the rows so each adapter reports corrupt data the same way.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use uuid::Uuid;

use crate::domain::{
    ClientId, DomainId, OwnedDomain, QuotaLimit, QuotaLimits, ResellerId, ResellerQuota,
    UsageCounters,
};

use super::schema::{
    admin, domain, domain_aliasses, idempotency_keys, log, mail_users, reseller_props,
};

// ---------------------------------------------------------------------------
// Reseller quota models
// ---------------------------------------------------------------------------

/// Row struct for reading from the reseller_props table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reseller_props)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ResellerPropsRow {
    pub reseller_id: i64,
    pub max_dmn_cnt: i64,
    pub current_dmn_cnt: i64,
    pub max_sub_cnt: i64,
    pub current_sub_cnt: i64,
    pub max_als_cnt: i64,
    pub current_als_cnt: i64,
    pub max_mail_cnt: i64,
    pub current_mail_cnt: i64,
    pub max_ftp_cnt: i64,
    pub current_ftp_cnt: i64,
    pub max_sql_db_cnt: i64,
    pub current_sql_db_cnt: i64,
    pub max_sql_user_cnt: i64,
    pub current_sql_user_cnt: i64,
    pub max_traff_amnt: i64,
    pub current_traff_amnt: i64,
    pub max_disk_amnt: i64,
    pub current_disk_amnt: i64,
}

fn limit(column: &str, raw: i64) -> Result<QuotaLimit, String> {
    QuotaLimit::from_raw(raw).map_err(|err| format!("{column}: {err}"))
}

fn counter(column: &str, raw: i64) -> Result<u64, String> {
    u64::try_from(raw).map_err(|_| format!("{column}: negative counter {raw}"))
}

impl ResellerPropsRow {
    /// Decode the stored maxima and counters.
    ///
    /// Returns a message naming the offending column when a value does not
    /// follow the stored encoding.
    pub fn into_quota(self) -> Result<ResellerQuota, String> {
        let limits = QuotaLimits {
            domains: limit("max_dmn_cnt", self.max_dmn_cnt)?,
            subdomains: limit("max_sub_cnt", self.max_sub_cnt)?,
            aliases: limit("max_als_cnt", self.max_als_cnt)?,
            mail_accounts: limit("max_mail_cnt", self.max_mail_cnt)?,
            ftp_accounts: limit("max_ftp_cnt", self.max_ftp_cnt)?,
            sql_databases: limit("max_sql_db_cnt", self.max_sql_db_cnt)?,
            sql_users: limit("max_sql_user_cnt", self.max_sql_user_cnt)?,
            traffic_mib: limit("max_traff_amnt", self.max_traff_amnt)?,
            disk_mib: limit("max_disk_amnt", self.max_disk_amnt)?,
        };
        let usage = UsageRow {
            current_dmn_cnt: self.current_dmn_cnt,
            current_sub_cnt: self.current_sub_cnt,
            current_als_cnt: self.current_als_cnt,
            current_mail_cnt: self.current_mail_cnt,
            current_ftp_cnt: self.current_ftp_cnt,
            current_sql_db_cnt: self.current_sql_db_cnt,
            current_sql_user_cnt: self.current_sql_user_cnt,
            current_traff_amnt: self.current_traff_amnt,
            current_disk_amnt: self.current_disk_amnt,
        }
        .into_counters()?;
        Ok(ResellerQuota {
            reseller_id: ResellerId::new(self.reseller_id),
            limits,
            usage,
        })
    }
}

/// Counters returned by the ledger recompute statement.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub(crate) struct UsageRow {
    #[diesel(sql_type = BigInt)]
    pub current_dmn_cnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_sub_cnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_als_cnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_mail_cnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_ftp_cnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_sql_db_cnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_sql_user_cnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_traff_amnt: i64,
    #[diesel(sql_type = BigInt)]
    pub current_disk_amnt: i64,
}

impl UsageRow {
    pub fn into_counters(self) -> Result<UsageCounters, String> {
        Ok(UsageCounters {
            domains: counter("current_dmn_cnt", self.current_dmn_cnt)?,
            subdomains: counter("current_sub_cnt", self.current_sub_cnt)?,
            aliases: counter("current_als_cnt", self.current_als_cnt)?,
            mail_accounts: counter("current_mail_cnt", self.current_mail_cnt)?,
            ftp_accounts: counter("current_ftp_cnt", self.current_ftp_cnt)?,
            sql_databases: counter("current_sql_db_cnt", self.current_sql_db_cnt)?,
            sql_users: counter("current_sql_user_cnt", self.current_sql_user_cnt)?,
            traffic_bytes: counter("current_traff_amnt", self.current_traff_amnt)?,
            disk_bytes: counter("current_disk_amnt", self.current_disk_amnt)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Account and domain models
// ---------------------------------------------------------------------------

/// Row struct for reading login data from the admin table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = admin)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AdminLoginRow {
    pub admin_id: i64,
    pub admin_name: String,
    pub admin_pass: String,
}

/// Client account listed in the alias form.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = admin)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ClientRow {
    pub admin_id: i64,
    pub admin_name: String,
}

/// Domain columns needed for ownership checks and alias inserts.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = domain)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DomainRow {
    pub domain_id: i64,
    pub domain_name: String,
    pub domain_admin_id: i64,
    pub domain_created_id: i64,
    pub domain_ip_id: i64,
}

impl From<DomainRow> for OwnedDomain {
    fn from(row: DomainRow) -> Self {
        Self {
            id: DomainId::new(row.domain_id),
            name: row.domain_name,
            client_id: ClientId::new(row.domain_admin_id),
            reseller_id: ResellerId::new(row.domain_created_id),
            ip_id: row.domain_ip_id,
        }
    }
}

/// Insertable struct for new alias rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = domain_aliasses)]
pub(crate) struct NewAliasRow<'a> {
    pub domain_id: i64,
    pub alias_name: &'a str,
    pub alias_mount: &'a str,
    pub alias_status: &'a str,
    pub alias_ip_id: i64,
    pub url_forward: &'a str,
}

/// Insertable struct for default alias mailboxes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = mail_users)]
pub(crate) struct NewMailUserRow<'a> {
    pub domain_id: i64,
    pub sub_id: i64,
    pub mail_acc: &'a str,
    pub mail_addr: String,
    pub mail_type: &'a str,
    pub mail_forward: &'a str,
    pub status: &'a str,
    pub is_default: bool,
}

// ---------------------------------------------------------------------------
// Audit log models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LogRow {
    pub log_id: i64,
    pub log_time: DateTime<Utc>,
    pub log_message: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = log)]
pub(crate) struct NewLogRow<'a> {
    pub log_message: &'a str,
}

// ---------------------------------------------------------------------------
// Idempotency key models
// ---------------------------------------------------------------------------

/// Row struct for reading from the idempotency_keys table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = idempotency_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdempotencyKeyRow {
    pub key: Uuid,
    pub reseller_id: i64,
    pub mutation_type: String,
    pub payload_hash: Vec<u8>,
    pub response_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating new idempotency records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = idempotency_keys)]
pub(crate) struct NewIdempotencyKeyRow<'a> {
    pub key: Uuid,
    pub reseller_id: i64,
    pub mutation_type: &'a str,
    pub payload_hash: &'a [u8],
    pub response_snapshot: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}
