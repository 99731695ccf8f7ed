//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the driven ports backed by PostgreSQL through
//! `diesel-async` and `bb8`.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and
//!   domain types. Quota rules stay in the domain, except the re-checks the
//!   alias insert repeats under its row lock.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Typed errors**: Diesel and pool errors map onto each port's error
//!   enum via `diesel_basic_error_mapping`.
//!
//! # Example
//!
//! ```ignore
//! use panel::outbound::persistence::{DbPool, DieselAliasRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/panel")).await?;
//! let aliases = DieselAliasRepository::new(pool.clone());
//! ```

mod diesel_alias_repository;
mod diesel_audit_log;
mod diesel_basic_error_mapping;
mod diesel_idempotency_repository;
mod diesel_login_service;
mod diesel_mailbox_bootstrap;
mod diesel_quota_repository;
mod diesel_reseller_overview_repository;
mod migrations;
mod models;
mod pool;
mod schema;
mod usage_ledger;

pub use diesel_alias_repository::DieselAliasRepository;
pub use diesel_audit_log::DieselAuditLog;
pub use diesel_idempotency_repository::DieselIdempotencyRepository;
pub use diesel_login_service::{DieselLoginService, password_digest};
pub use diesel_mailbox_bootstrap::DieselMailboxBootstrap;
pub use diesel_quota_repository::DieselQuotaRepository;
pub use diesel_reseller_overview_repository::DieselResellerOverviewRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
