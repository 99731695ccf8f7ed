//! Correlation id shared by log lines, error payloads and audit traces.
//!
//! The [`Trace`](crate::Trace) middleware places one id in task-local storage
//! per request. Anything running inside the handler future reads it with
//! [`TraceId::current`]; work moved onto another task must be wrapped in
//! [`TraceId::scope`] because task-locals do not follow `tokio::spawn`.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static CURRENT: TraceId;
}

/// UUID identifying one HTTP request.
///
/// # Examples
/// ```
/// use panel::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let upstream = TraceId::from_upstream(Some("5b1f7c9e-3d0a-4c58-9b76-2e0d4f6a8c11"));
/// let seen = TraceId::scope(upstream, async { TraceId::current() }).await;
/// assert_eq!(seen, Some(upstream));
/// assert_eq!(upstream.to_string(), "5b1f7c9e-3d0a-4c58-9b76-2e0d4f6a8c11");
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse an id forwarded by a proxy, or mint a new one.
    ///
    /// Values that are not UUIDs are ignored so clients cannot inject
    /// arbitrary text into logs.
    #[must_use]
    pub fn from_upstream(header: Option<&str>) -> Self {
        header
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Id of the request being served, if any.
    #[must_use]
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|id| *id).ok()
    }

    /// Run `fut` with `trace_id` as the current id.
    pub async fn scope<F: Future>(trace_id: TraceId, fut: F) -> F::Output {
        CURRENT.scope(trace_id, fut).await
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}
