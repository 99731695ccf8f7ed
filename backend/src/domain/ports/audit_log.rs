//! Port for the control panel audit log.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{AuditLogEntry, AuditLogId, audit_message};

use super::define_port_error;

define_port_error! {
    /// Errors raised by audit log adapters.
    pub enum AuditLogError {
        /// Log storage connection could not be established.
        Connection { message: String } => "audit log connection failed: {message}",
        /// The entry could not be written.
        Write { message: String } => "audit log write failed: {message}",
    }
}

/// Append-only audit log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Record `"<actor_login>: <action>"`.
    async fn append(&self, actor_login: &str, action: &str) -> Result<AuditLogEntry, AuditLogError>;
}

/// Audit log that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuditLog;

#[async_trait]
impl AuditLog for FixtureAuditLog {
    async fn append(
        &self,
        actor_login: &str,
        action: &str,
    ) -> Result<AuditLogEntry, AuditLogError> {
        Ok(AuditLogEntry {
            id: AuditLogId::new(0),
            logged_at: Utc::now(),
            message: audit_message(actor_login, action),
        })
    }
}
