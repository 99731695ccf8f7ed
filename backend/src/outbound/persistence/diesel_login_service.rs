//! Diesel-backed `LoginService` checking reseller accounts.
//!
//! Passwords are stored as the lowercase hex SHA-256 digest in
//! `admin.admin_pass`. Unknown logins, non-reseller accounts and wrong
//! passwords all fail with the same `Unauthorized` error.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::ports::LoginService;
use crate::domain::{Error, LoginCredentials, ResellerId, ResellerSession};

use super::models::AdminLoginRow;
use super::pool::DbPool;
use super::schema::admin;

const RESELLER_TYPE: &str = "reseller";

#[derive(Clone)]
pub struct DieselLoginService {
    pool: DbPool,
}

impl DieselLoginService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Lowercase hex SHA-256 of `password`.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn digests_match(stored: &str, candidate: &str) -> bool {
    let stored = stored.as_bytes();
    let candidate = candidate.as_bytes();
    stored.len() == candidate.len()
        && stored
            .iter()
            .zip(candidate)
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

#[async_trait]
impl LoginService for DieselLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<ResellerSession, Error> {
        let mut conn = self.pool.get().await.map_err(|err| {
            warn!(error = %err, "login pool checkout failed");
            Error::service_unavailable("login is temporarily unavailable")
        })?;

        let row: Option<AdminLoginRow> = admin::table
            .filter(
                admin::admin_name
                    .eq(credentials.username())
                    .and(admin::admin_type.eq(RESELLER_TYPE)),
            )
            .select(AdminLoginRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                warn!(error = %err, "login query failed");
                Error::internal("login query failed")
            })?;

        let Some(row) = row else {
            return Err(invalid_credentials());
        };
        let candidate = password_digest(credentials.password());
        if !digests_match(&row.admin_pass.to_ascii_lowercase(), &candidate) {
            return Err(invalid_credentials());
        }

        Ok(ResellerSession {
            reseller_id: ResellerId::new(row.admin_id),
            login: row.admin_name,
        })
    }
}
