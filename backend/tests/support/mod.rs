//! Shared helpers for panel integration tests.
//!
//! Database helpers talk to PostgreSQL through the synchronous `postgres`
//! client so `DROP DATABASE` and seeding stay outside Diesel transactions.

#![allow(dead_code, reason = "each suite uses a subset of the helpers")]

pub mod cluster_skip;
pub mod pg_embed;

use panel::domain::UsageCounters;
use panel::outbound::persistence::{password_digest, run_pending_migrations};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};

pub use cluster_skip::handle_cluster_setup_failure;

/// Render a `postgres` error with SQLSTATE and detail.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

/// Drop and recreate `name`, then apply the embedded migrations.
///
/// Returns the database URL.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<String, String> {
    let admin_url = cluster.connection().database_url("postgres");
    let mut client = Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!(
            "DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE); CREATE DATABASE \"{name}\";"
        ))
        .map_err(|err| format_postgres_error(&err))?;

    let url = cluster.connection().database_url(name);
    run_pending_migrations(&url).map_err(|err| err.to_string())?;
    Ok(url)
}

/// Seeded identifiers of the standard fixture tree.
pub struct SeededPanel {
    pub reseller_id: i64,
    pub client_id: i64,
    pub domain_id: i64,
    pub second_domain_id: i64,
    pub other_reseller_domain_id: i64,
}

pub const RESELLER_LOGIN: &str = "reseller1";
pub const RESELLER_PASSWORD: &str = "s3cret";

/// Counters matching the entities written by [`seed_panel`] for the first
/// reseller, before any alias exists.
pub fn seeded_usage() -> UsageCounters {
    UsageCounters {
        domains: 2,
        subdomains: 1,
        aliases: 0,
        mail_accounts: 7,
        ftp_accounts: 3,
        sql_databases: 2,
        sql_users: 2,
        traffic_bytes: 0,
        disk_bytes: 0,
    }
}

/// Seed one reseller with a client owning `example.org` (with a `/blog`
/// subdomain mount, mail, FTP and SQL accounts) and `second.org`, plus a
/// second reseller owning `other.org`.
pub fn seed_panel(url: &str, alias_limit: i64) -> Result<SeededPanel, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let digest = password_digest(RESELLER_PASSWORD);

    let mut insert_admin = |name: &str, kind: &str, parent: Option<i64>| -> Result<i64, String> {
        client
            .query_one(
                "INSERT INTO admin (admin_name, admin_pass, admin_type, email, created_by) \
                 VALUES ($1, $2, $3, $4, $5) RETURNING admin_id",
                &[&name, &digest, &kind, &format!("{name}@example.net"), &parent],
            )
            .map(|row| row.get(0))
            .map_err(|err| format_postgres_error(&err))
    };
    let reseller_id = insert_admin(RESELLER_LOGIN, "reseller", None)?;
    let client_id = insert_admin("alice", "user", Some(reseller_id))?;
    let other_reseller = insert_admin("reseller2", "reseller", None)?;
    let other_client = insert_admin("bob", "user", Some(other_reseller))?;

    client
        .execute(
            "INSERT INTO reseller_props (reseller_id, max_als_cnt) VALUES ($1, $2), ($3, 0)",
            &[&reseller_id, &alias_limit, &other_reseller],
        )
        .map_err(|err| format_postgres_error(&err))?;

    let mut insert_domain = |name: &str, owner: i64, creator: i64| -> Result<i64, String> {
        client
            .query_one(
                "INSERT INTO domain \
                 (domain_name, domain_admin_id, domain_created_id, domain_ip_id) \
                 VALUES ($1, $2, $3, 1) RETURNING domain_id",
                &[&name, &owner, &creator],
            )
            .map(|row| row.get(0))
            .map_err(|err| format_postgres_error(&err))
    };
    let domain_id = insert_domain("example.org", client_id, reseller_id)?;
    let second_domain_id = insert_domain("second.org", client_id, reseller_id)?;
    let other_reseller_domain_id = insert_domain("other.org", other_client, other_reseller)?;

    client
        .execute(
            "INSERT INTO subdomain (domain_id, subdomain_name, subdomain_mount, subdomain_status) \
             VALUES ($1, 'blog', '/blog', 'ok')",
            &[&domain_id],
        )
        .map_err(|err| format_postgres_error(&err))?;

    client
        .execute(
            "INSERT INTO mail_users (domain_id, mail_acc, mail_addr, mail_type, status) \
             SELECT $1::bigint, 'user' || n, 'user' || n || '@example.org', 'normal_mail', 'ok' \
             FROM generate_series(1, 7) AS n",
            &[&domain_id],
        )
        .map_err(|err| format_postgres_error(&err))?;
    client
        .execute(
            "INSERT INTO ftp_users (domain_id, userid, status) \
             SELECT $1::bigint, 'ftp' || n || '@example.org', 'ok' FROM generate_series(1, 3) AS n",
            &[&domain_id],
        )
        .map_err(|err| format_postgres_error(&err))?;
    client
        .execute(
            "WITH dbs AS ( \
                 INSERT INTO sql_database (domain_id, sqld_name) \
                 SELECT $1::bigint, 'example_db' || n FROM generate_series(1, 2) AS n \
                 RETURNING sqld_id \
             ) \
             INSERT INTO sql_user (sqld_id, sqlu_name) SELECT sqld_id, 'user' || sqld_id FROM dbs",
            &[&domain_id],
        )
        .map_err(|err| format_postgres_error(&err))?;

    Ok(SeededPanel {
        reseller_id,
        client_id,
        domain_id,
        second_domain_id,
        other_reseller_domain_id,
    })
}

/// Count rows matching a single-parameter query.
pub fn count_rows(url: &str, sql: &str, param: &str) -> Result<i64, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .query_one(sql, &[&param])
        .map(|row| row.get(0))
        .map_err(|err| format_postgres_error(&err))
}
