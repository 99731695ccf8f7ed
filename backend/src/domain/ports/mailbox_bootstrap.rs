//! Port creating the default forward mailboxes of a new alias.

use async_trait::async_trait;

use crate::domain::DomainAlias;

use super::define_port_error;

define_port_error! {
    /// Errors raised by mailbox bootstrap adapters.
    pub enum MailboxBootstrapError {
        /// Mail storage connection could not be established.
        Connection { message: String } => "mailbox bootstrap connection failed: {message}",
        /// The mailboxes could not be created.
        Write { message: String } => "mailbox bootstrap failed: {message}",
    }
}

/// Local parts of the mailboxes created for every new alias.
pub const DEFAULT_MAILBOXES: [&str; 4] = ["abuse", "hostmaster", "postmaster", "webmaster"];

/// Creates `abuse@`, `hostmaster@`, `postmaster@` and `webmaster@` forwards
/// pointing at the owning client's address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailboxBootstrap: Send + Sync {
    /// Create the default mailboxes; returns how many were written.
    async fn create_default_mailboxes(
        &self,
        alias: &DomainAlias,
    ) -> Result<u32, MailboxBootstrapError>;
}

/// Bootstrap that creates nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMailboxBootstrap;

#[async_trait]
impl MailboxBootstrap for FixtureMailboxBootstrap {
    async fn create_default_mailboxes(
        &self,
        _alias: &DomainAlias,
    ) -> Result<u32, MailboxBootstrapError> {
        Ok(0)
    }
}
