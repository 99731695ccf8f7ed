//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::Error;
use crate::domain::ports::{
    AliasFormQuery, AliasProvisioner, LoginService, QuotaLedger, ResellerOverviewQuery,
};
use crate::inbound::http::error::request_timeout_error;

/// Deadline applied when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub login: Arc<dyn LoginService>,
    pub quota: Arc<dyn QuotaLedger>,
    pub aliases: Arc<dyn AliasProvisioner>,
    pub alias_form: Arc<dyn AliasFormQuery>,
    pub overview: Arc<dyn ResellerOverviewQuery>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub quota: Arc<dyn QuotaLedger>,
    pub aliases: Arc<dyn AliasProvisioner>,
    pub alias_form: Arc<dyn AliasFormQuery>,
    pub overview: Arc<dyn ResellerOverviewQuery>,
    request_timeout: Duration,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle with the default deadline.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// use panel::domain::ports::{
    ///     FixtureAliasRepository, FixtureAuditLog, FixtureIdempotencyRepository,
    ///     FixtureLoginService, FixtureMailboxBootstrap, FixtureQuotaRepository,
    ///     FixtureResellerOverviewRepository,
    /// };
    /// use panel::domain::{
    ///     AliasProvisioningPorts, AliasProvisioningService, ProvisioningPolicy,
    ///     QuotaLedgerService, ResellerOverviewService,
    /// };
    /// use panel::inbound::http::state::{HttpState, HttpStatePorts};
    /// use panel::outbound::propagation::LoggingPropagationSignal;
    ///
    /// let quota = Arc::new(FixtureQuotaRepository);
    /// let provisioner = Arc::new(AliasProvisioningService::new(
    ///     AliasProvisioningPorts {
    ///         quota: quota.clone(),
    ///         aliases: Arc::new(FixtureAliasRepository),
    ///         audit: Arc::new(FixtureAuditLog),
    ///         mailboxes: Arc::new(FixtureMailboxBootstrap),
    ///         propagation: Arc::new(LoggingPropagationSignal::new()),
    ///         idempotency: Arc::new(FixtureIdempotencyRepository),
    ///     },
    ///     ProvisioningPolicy::default(),
    /// ));
    /// let state = HttpState::new(HttpStatePorts {
    ///     login: Arc::new(FixtureLoginService),
    ///     quota: Arc::new(QuotaLedgerService::new(quota.clone())),
    ///     aliases: provisioner.clone(),
    ///     alias_form: provisioner,
    ///     overview: Arc::new(ResellerOverviewService::new(
    ///         Arc::new(FixtureResellerOverviewRepository),
    ///         quota,
    ///     )),
    /// })
    /// .with_request_timeout(Duration::from_secs(5));
    /// assert_eq!(state.request_timeout(), Duration::from_secs(5));
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            login,
            quota,
            aliases,
            alias_form,
            overview,
        } = ports;
        Self {
            login,
            quota,
            aliases,
            alias_form,
            overview,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Replace the per-request deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Deadline applied to each port call.
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Run a port call under the request deadline.
    ///
    /// An elapsed deadline yields `service_unavailable` with the detail code
    /// `request_timeout`; the call itself is dropped.
    pub async fn bounded<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        tokio::time::timeout(self.request_timeout, call)
            .await
            .map_err(request_timeout_error)?
    }
}
