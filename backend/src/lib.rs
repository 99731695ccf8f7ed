//! Reseller hosting panel library.
//!
//! Hexagonal layout: [`domain`] holds the quota ledger, alias validation and
//! provisioning rules behind ports; [`inbound`] exposes them over HTTP;
//! [`outbound`] implements the driven ports on PostgreSQL.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
