//! Reseller dashboard handlers: overview and quota ledger.
//!
//! ```text
//! GET  /api/v1/reseller/overview
//! GET  /api/v1/reseller/quota
//! POST /api/v1/reseller/quota/recompute
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::{ResellerOverview, ResellerQuota, Resource, UsageCounters, UsageLine};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, ResellerOverviewSchema, UsageCountersSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Quota ledger view: one line per resource, measured ones included.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuotaResponse {
    #[schema(example = 12)]
    pub reseller_id: i64,
    /// Traffic and disk usage are in bytes, their limits in MiB.
    #[schema(value_type = Vec<Object>)]
    pub usage: Vec<UsageLine>,
}

impl From<&ResellerQuota> for QuotaResponse {
    fn from(snapshot: &ResellerQuota) -> Self {
        Self {
            reseller_id: snapshot.reseller_id.get(),
            usage: Resource::ALL
                .into_iter()
                .map(|resource| UsageLine::from_quota(snapshot, resource))
                .collect(),
        }
    }
}

/// Landing overview of the signed-in reseller.
#[utoipa::path(
    get,
    path = "/api/v1/reseller/overview",
    responses(
        (status = 200, description = "Reseller overview", body = ResellerOverviewSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Reseller not found", body = ErrorSchema),
        (status = 503, description = "Storage unavailable or timed out", body = ErrorSchema)
    ),
    tags = ["reseller"],
    operation_id = "resellerOverview"
)]
#[get("/reseller/overview")]
pub async fn overview(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ResellerOverview>> {
    let context = session.require_context()?;
    let view = state
        .bounded(state.overview.overview(context.reseller_id))
        .await?;
    Ok(web::Json(view))
}

/// Cached usage counters and limits.
#[utoipa::path(
    get,
    path = "/api/v1/reseller/quota",
    responses(
        (status = 200, description = "Quota ledger", body = QuotaResponse),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Reseller not found", body = ErrorSchema)
    ),
    tags = ["reseller"],
    operation_id = "resellerQuota"
)]
#[get("/reseller/quota")]
pub async fn quota(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<QuotaResponse>> {
    let context = session.require_context()?;
    let snapshot = state
        .bounded(state.quota.snapshot(context.reseller_id))
        .await?;
    Ok(web::Json(QuotaResponse::from(&snapshot)))
}

/// Recount every resource from the stored entities.
#[utoipa::path(
    post,
    path = "/api/v1/reseller/quota/recompute",
    responses(
        (status = 200, description = "Fresh usage counters", body = UsageCountersSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 404, description = "Reseller not found", body = ErrorSchema)
    ),
    tags = ["reseller"],
    operation_id = "recomputeQuota"
)]
#[post("/reseller/quota/recompute")]
pub async fn recompute_quota(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UsageCounters>> {
    let context = session.require_context()?;
    let usage = state
        .bounded(state.quota.recompute(context.reseller_id))
        .await?;
    Ok(web::Json(usage))
}
