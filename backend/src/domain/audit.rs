//! Control panel audit log records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::AuditLogId;

/// One line of the panel's audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub logged_at: DateTime<Utc>,
    pub message: String,
}

/// Format an audit message as `"<actor>: <action>"`.
///
/// # Examples
/// ```
/// use panel::domain::audit_message;
///
/// assert_eq!(
///     audit_message("reseller1", "add domain alias: shop.tld"),
///     "reseller1: add domain alias: shop.tld"
/// );
/// ```
pub fn audit_message(actor_login: &str, action: &str) -> String {
    format!("{actor_login}: {action}")
}
