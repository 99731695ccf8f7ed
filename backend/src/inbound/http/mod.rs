//! HTTP inbound adapter exposing the panel's REST endpoints.

use actix_web::web;

pub mod aliases;
pub mod auth;
pub mod error;
pub mod health;
pub mod idempotency;
pub mod reseller;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

/// Register every session-scoped endpoint.
///
/// Mounted under `/api/v1` behind the session middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(reseller::overview)
        .service(reseller::quota)
        .service(reseller::recompute_quota)
        .service(aliases::alias_form)
        .service(aliases::create_alias);
}
