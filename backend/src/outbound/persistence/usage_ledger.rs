//! Ledger recompute shared by the quota and alias repositories.
//!
//! Counts every non-deleted entity owned by the reseller's clients and
//! overwrites the cached `current_*` columns in one statement, so callers
//! inside a transaction see the counters their own writes produced.

use diesel::sql_query;
use diesel::sql_types::{BigInt, Bool};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ResellerId;

use super::models::UsageRow;

/// `$1` is the reseller id, `$2` whether default mailboxes count.
const RECOMPUTE_USAGE_SQL: &str = r#"
UPDATE reseller_props AS rp SET
    current_dmn_cnt = (
        SELECT COUNT(*) FROM domain d
        WHERE d.domain_created_id = $1 AND d.domain_status <> 'todelete'
    ),
    current_sub_cnt = (
        SELECT COUNT(*) FROM subdomain s
        JOIN domain d ON d.domain_id = s.domain_id
        WHERE d.domain_created_id = $1 AND s.subdomain_status <> 'todelete'
    ) + (
        SELECT COUNT(*) FROM subdomain_alias sa
        JOIN domain_aliasses a ON a.alias_id = sa.alias_id
        JOIN domain d ON d.domain_id = a.domain_id
        WHERE d.domain_created_id = $1 AND sa.subdomain_alias_status <> 'todelete'
    ),
    current_als_cnt = (
        SELECT COUNT(*) FROM domain_aliasses a
        JOIN domain d ON d.domain_id = a.domain_id
        WHERE d.domain_created_id = $1 AND a.alias_status <> 'todelete'
    ),
    current_mail_cnt = (
        SELECT COUNT(*) FROM mail_users m
        JOIN domain d ON d.domain_id = m.domain_id
        WHERE d.domain_created_id = $1 AND m.status <> 'todelete'
          AND ($2 OR NOT m.is_default)
    ),
    current_ftp_cnt = (
        SELECT COUNT(*) FROM ftp_users f
        JOIN domain d ON d.domain_id = f.domain_id
        WHERE d.domain_created_id = $1 AND f.status <> 'todelete'
    ),
    current_sql_db_cnt = (
        SELECT COUNT(*) FROM sql_database db
        JOIN domain d ON d.domain_id = db.domain_id
        WHERE d.domain_created_id = $1 AND db.status <> 'todelete'
    ),
    current_sql_user_cnt = (
        SELECT COUNT(*) FROM sql_user u
        JOIN sql_database db ON db.sqld_id = u.sqld_id
        JOIN domain d ON d.domain_id = db.domain_id
        WHERE d.domain_created_id = $1 AND u.status <> 'todelete'
    ),
    current_traff_amnt = (
        SELECT COALESCE(SUM(d.domain_traffic_bytes), 0)::bigint FROM domain d
        WHERE d.domain_created_id = $1 AND d.domain_status <> 'todelete'
    ),
    current_disk_amnt = (
        SELECT COALESCE(SUM(d.domain_disk_usage), 0)::bigint FROM domain d
        WHERE d.domain_created_id = $1 AND d.domain_status <> 'todelete'
    )
WHERE rp.reseller_id = $1
RETURNING
    rp.current_dmn_cnt,
    rp.current_sub_cnt,
    rp.current_als_cnt,
    rp.current_mail_cnt,
    rp.current_ftp_cnt,
    rp.current_sql_db_cnt,
    rp.current_sql_user_cnt,
    rp.current_traff_amnt,
    rp.current_disk_amnt
"#;

/// Recount and persist the reseller's usage counters.
///
/// Returns `Ok(None)` when the reseller has no quota row.
pub(crate) async fn recompute_usage(
    conn: &mut AsyncPgConnection,
    reseller_id: ResellerId,
    count_default_mailboxes: bool,
) -> Result<Option<UsageRow>, diesel::result::Error> {
    let rows: Vec<UsageRow> = sql_query(RECOMPUTE_USAGE_SQL)
        .bind::<BigInt, _>(reseller_id.get())
        .bind::<Bool, _>(count_default_mailboxes)
        .load(conn)
        .await?;
    Ok(rows.into_iter().next())
}
