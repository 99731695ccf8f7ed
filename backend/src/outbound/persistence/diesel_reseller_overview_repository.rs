//! PostgreSQL-backed `ResellerOverviewRepository`.
//!
//! Loads the reseller's login and feature flags together with the counters
//! behind the overview notices: open tickets awaiting a reply, confirmed
//! orders waiting for approval and aliases clients have ordered.

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ResellerOverviewRepository, ResellerOverviewRepositoryError};
use crate::domain::{
    ItemStatus, ResellerAccount, ResellerFeatures, ResellerId, ResellerOverviewRecord,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::pool::{DbPool, PoolError};
use super::schema::{admin, domain, domain_aliasses, orders, reseller_props, tickets};

/// Ticket states that still expect an answer from the reseller.
const OPEN_TICKET_STATES: [i32; 2] = [1, 4];
const CONFIRMED_ORDER: &str = "confirmed";

#[derive(Clone)]
pub struct DieselResellerOverviewRepository {
    pool: DbPool,
}

impl DieselResellerOverviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ResellerOverviewRepositoryError {
    map_basic_pool_error(error, ResellerOverviewRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ResellerOverviewRepositoryError {
    map_basic_diesel_error(
        error,
        ResellerOverviewRepositoryError::query,
        ResellerOverviewRepositoryError::connection,
    )
}

fn count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or_default()
}

#[async_trait]
impl ResellerOverviewRepository for DieselResellerOverviewRepository {
    async fn load_overview(
        &self,
        reseller_id: ResellerId,
    ) -> Result<Option<ResellerOverviewRecord>, ResellerOverviewRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = reseller_id.get();

        let account: Option<(String, bool, bool, bool)> = admin::table
            .inner_join(reseller_props::table)
            .filter(admin::admin_id.eq(id))
            .select((
                admin::admin_name,
                reseller_props::support_system,
                reseller_props::php_ini_system,
                reseller_props::software_allowed,
            ))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some((login, support_system, php_ini_system, software_allowed)) = account else {
            return Ok(None);
        };

        let open_tickets: i64 = tickets::table
            .filter(
                tickets::ticket_to
                    .eq(id)
                    .and(tickets::ticket_status.eq_any(OPEN_TICKET_STATES))
                    .and(tickets::ticket_reply.eq(0)),
            )
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let pending_orders: i64 = orders::table
            .filter(orders::user_id.eq(id).and(orders::status.eq(CONFIRMED_ORDER)))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let ordered_aliases: i64 = domain_aliasses::table
            .inner_join(domain::table)
            .filter(
                domain::domain_created_id
                    .eq(id)
                    .and(domain_aliasses::alias_status.eq(ItemStatus::Ordered.as_str())),
            )
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(Some(ResellerOverviewRecord {
            account: ResellerAccount {
                login,
                features: ResellerFeatures {
                    support_system,
                    php_ini_system,
                    software_allowed,
                },
            },
            open_tickets: count(open_tickets),
            pending_orders: count(pending_orders),
            ordered_aliases: count(ordered_aliases),
        }))
    }
}
