//! Test helpers for inbound HTTP components.

use std::sync::Arc;
use std::time::Duration;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};

use crate::domain::ports::{
    AliasFormQuery, AliasProvisioner, FixtureLoginService, LoginService, MockAliasFormQuery,
    MockAliasProvisioner, MockQuotaLedger, MockResellerOverviewQuery, QuotaLedger,
    ResellerOverviewQuery,
};
use crate::inbound::http::auth::LoginRequest;
use crate::inbound::http::error::json_error_handler;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Development account accepted by [`FixtureLoginService`].
pub const FIXTURE_LOGIN: &str = "reseller";
pub const FIXTURE_PASSWORD: &str = "password";

/// Build a session middleware configured for tests.
///
/// Generates a fresh key per invocation and disables the `Secure` flag so
/// plain HTTP test requests keep the cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// The `session` cookie set by a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("session cookie set")
}

/// HTTP state with the fixture login and expectation-free mocks elsewhere.
///
/// Tests swap in the port they exercise; any unexpected call on the other
/// mocks fails the test.
pub struct TestPortsBuilder {
    login: Arc<dyn LoginService>,
    quota: Arc<dyn QuotaLedger>,
    aliases: Arc<dyn AliasProvisioner>,
    alias_form: Arc<dyn AliasFormQuery>,
    overview: Arc<dyn ResellerOverviewQuery>,
    request_timeout: Option<Duration>,
}

impl Default for TestPortsBuilder {
    fn default() -> Self {
        Self {
            login: Arc::new(FixtureLoginService),
            quota: Arc::new(MockQuotaLedger::new()),
            aliases: Arc::new(MockAliasProvisioner::new()),
            alias_form: Arc::new(MockAliasFormQuery::new()),
            overview: Arc::new(MockResellerOverviewQuery::new()),
            request_timeout: None,
        }
    }
}

impl TestPortsBuilder {
    pub fn quota(mut self, quota: Arc<dyn QuotaLedger>) -> Self {
        self.quota = quota;
        self
    }

    pub fn aliases(mut self, aliases: Arc<dyn AliasProvisioner>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn alias_form(mut self, alias_form: Arc<dyn AliasFormQuery>) -> Self {
        self.alias_form = alias_form;
        self
    }

    pub fn overview(mut self, overview: Arc<dyn ResellerOverviewQuery>) -> Self {
        self.overview = overview;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> HttpState {
        let state = HttpState::new(HttpStatePorts {
            login: self.login,
            quota: self.quota,
            aliases: self.aliases,
            alias_form: self.alias_form,
            overview: self.overview,
        });
        match self.request_timeout {
            Some(timeout) => state.with_request_timeout(timeout),
            None => state,
        }
    }
}

/// Application exposing every panel endpoint under `/api/v1`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .wrap(test_session_middleware())
        .service(web::scope("/api/v1").configure(super::configure))
}

/// Log in with the fixture account and return the session cookie.
pub async fn login_cookie<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let request = test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(&LoginRequest {
            username: FIXTURE_LOGIN.to_owned(),
            password: FIXTURE_PASSWORD.to_owned(),
        })
        .to_request();
    let response = test::call_service(app, request).await;
    assert!(response.status().is_success(), "fixture login failed");
    session_cookie(&response)
}
