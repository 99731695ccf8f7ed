//! Reseller authentication and the per-request actor context.
//!
//! Handlers parse login payloads into [`LoginCredentials`] before calling the
//! [`crate::domain::ports::LoginService`] port, and rebuild a
//! [`RequestContext`] from the session on every authenticated request.

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::ResellerId;

/// Reasons a login payload is rejected before reaching storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials.
///
/// The login name is trimmed; the password is kept verbatim and wiped from
/// memory on drop.
///
/// # Examples
/// ```
/// use panel::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" reseller1 ", "s3cret").expect("valid");
/// assert_eq!(creds.username(), "reseller1");
/// assert_eq!(creds.password(), "s3cret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Validate raw payload fields.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: username.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Login name used for the account lookup.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password as supplied.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Authenticated reseller stored in the session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResellerSession {
    pub reseller_id: ResellerId,
    pub login: String,
}

/// Actor on whose behalf an operation runs.
///
/// Built explicitly from the session so services never reach for ambient
/// request state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub reseller_id: ResellerId,
    /// Login name recorded in audit entries.
    pub actor_login: String,
}

impl RequestContext {
    /// Context for a reseller.
    pub fn new(reseller_id: ResellerId, actor_login: impl Into<String>) -> Self {
        Self {
            reseller_id,
            actor_login: actor_login.into(),
        }
    }
}

impl From<ResellerSession> for RequestContext {
    fn from(session: ResellerSession) -> Self {
        Self {
            reseller_id: session.reseller_id,
            actor_login: session.login,
        }
    }
}
