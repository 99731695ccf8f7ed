//! Driving port for reseller login.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, ResellerId, ResellerSession};

/// Reseller authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Check credentials; failures never reveal which part was wrong.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<ResellerSession, Error>;
}

const FIXTURE_LOGIN: &str = "reseller";
const FIXTURE_PASSWORD: &str = "password";

/// Development authenticator used when no database is configured.
///
/// Accepts `reseller` / `password` as reseller 1.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLoginService;

#[async_trait]
impl LoginService for FixtureLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<ResellerSession, Error> {
        if credentials.username() == FIXTURE_LOGIN && credentials.password() == FIXTURE_PASSWORD {
            Ok(ResellerSession {
                reseller_id: ResellerId::new(1),
                login: FIXTURE_LOGIN.to_owned(),
            })
        } else {
            Err(Error::unauthorized("invalid credentials"))
        }
    }
}
