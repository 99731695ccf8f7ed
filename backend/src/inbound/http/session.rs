//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie carries the authenticated reseller id and login name; every
//! authenticated handler turns them back into a [`RequestContext`].

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, RequestContext, ResellerId, ResellerSession};

pub(crate) const RESELLER_ID_KEY: &str = "reseller_id";
pub(crate) const LOGIN_KEY: &str = "login";

fn session_read_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to read session: {error}"))
}

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated reseller in the session cookie.
    pub fn persist_reseller(&self, session: &ResellerSession) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(RESELLER_ID_KEY, session.reseller_id.get())
            .and_then(|()| self.0.insert(LOGIN_KEY, session.login.as_str()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop everything stored for the current visitor.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// The reseller stored in the session, if any.
    ///
    /// Cookies missing either half, or carrying a non-positive id, are
    /// treated as anonymous.
    pub fn reseller(&self) -> Result<Option<ResellerSession>, Error> {
        let reseller_id = self
            .0
            .get::<i64>(RESELLER_ID_KEY)
            .map_err(session_read_error)?;
        let login = self.0.get::<String>(LOGIN_KEY).map_err(session_read_error)?;
        match (reseller_id, login) {
            (Some(id), Some(login)) if id > 0 && !login.is_empty() => Ok(Some(ResellerSession {
                reseller_id: ResellerId::new(id),
                login,
            })),
            (None, None) => Ok(None),
            _ => {
                warn!("incomplete reseller session cookie");
                Ok(None)
            }
        }
    }

    /// Require an authenticated reseller or return `401 Unauthorized`.
    pub fn require_context(&self) -> Result<RequestContext, Error> {
        self.reseller()?
            .map(RequestContext::from)
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
