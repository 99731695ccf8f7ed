//! Domain alias handlers.
//!
//! ```text
//! GET  /api/v1/aliases/form
//! POST /api/v1/aliases {"domainId":7,"aliasName":"shop.example.org","mountPoint":"/shop"}
//! POST /api/v1/aliases {"domainId":7,"aliasName":"old.example.org",
//!                       "forward":{"prefix":"https://","target":"example.com"}}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{AliasForm, AliasProvisioningRequest, ForwardRequest};
use crate::domain::{DomainId, Error, RequestContext};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::{extract_idempotency_key, map_idempotency_key_error};
use crate::inbound::http::schemas::{AliasCreatedSchema, AliasFormSchema, ErrorSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_forward_prefix, parse_positive_id, require,
};

const DOMAIN_ID: FieldName = FieldName::new("domainId");
const ALIAS_NAME: FieldName = FieldName::new("aliasName");
const MOUNT_POINT: FieldName = FieldName::new("mountPoint");
const FORWARD_PREFIX: FieldName = FieldName::new("forward.prefix");
const FORWARD_TARGET: FieldName = FieldName::new("forward.target");

/// Redirect part of [`CreateAliasRequest`].
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForwardBody {
    #[schema(example = "https://")]
    pub prefix: Option<String>,
    #[schema(example = "example.com")]
    pub target: Option<String>,
}

/// Request body for `POST /api/v1/aliases`.
///
/// `mountPoint` is required unless `forward` is present; forwarding aliases
/// always mount at `/`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAliasRequest {
    #[schema(example = 7)]
    pub domain_id: Option<i64>,
    #[schema(example = "shop.example.org")]
    pub alias_name: Option<String>,
    #[schema(example = "/shop")]
    pub mount_point: Option<String>,
    pub forward: Option<ForwardBody>,
}

fn parse_forward(body: ForwardBody) -> Result<ForwardRequest, Error> {
    let prefix = require(body.prefix, FORWARD_PREFIX)?;
    let prefix = parse_forward_prefix(prefix.trim(), FORWARD_PREFIX)?;
    let target = require(body.target, FORWARD_TARGET)?;
    Ok(ForwardRequest { prefix, target })
}

impl CreateAliasRequest {
    fn into_domain(self, context: RequestContext) -> Result<AliasProvisioningRequest, Error> {
        let domain_id = parse_positive_id(require(self.domain_id, DOMAIN_ID)?, DOMAIN_ID)?;
        let proposed_name = require(self.alias_name, ALIAS_NAME)?;
        let forward = self.forward.map(parse_forward).transpose()?;
        let mount_point = match (&forward, self.mount_point) {
            (_, Some(mount_point)) => mount_point,
            (Some(_), None) => "/".to_owned(),
            (None, None) => require(None, MOUNT_POINT)?,
        };
        Ok(AliasProvisioningRequest {
            context,
            domain_id: DomainId::new(domain_id),
            proposed_name,
            mount_point,
            forward,
            idempotency_key: None,
        })
    }
}

/// Data for the alias creation form.
#[utoipa::path(
    get,
    path = "/api/v1/aliases/form",
    responses(
        (status = 200, description = "Clients, domains and alias quota", body = AliasFormSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Aliases disabled or quota exhausted", body = ErrorSchema),
        (status = 404, description = "Reseller has no clients", body = ErrorSchema)
    ),
    tags = ["aliases"],
    operation_id = "aliasForm"
)]
#[get("/aliases/form")]
pub async fn alias_form(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AliasForm>> {
    let context = session.require_context()?;
    let form = state.bounded(state.alias_form.alias_form(&context)).await?;
    Ok(web::Json(form))
}

/// Create a domain alias for one of the reseller's client domains.
///
/// Sending the same `Idempotency-Key` with the same body replays the first
/// response without creating anything.
#[utoipa::path(
    post,
    path = "/api/v1/aliases",
    request_body = CreateAliasRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "UUID making retries safe")
    ),
    responses(
        (status = 201, description = "Alias created", body = AliasCreatedSchema),
        (status = 200, description = "Earlier creation replayed", body = AliasCreatedSchema),
        (status = 400, description = "Invalid name, target or mount point", body = ErrorSchema),
        (status = 401, description = "Login required", body = ErrorSchema),
        (status = 403, description = "Alias quota reached", body = ErrorSchema),
        (status = 404, description = "Domain not found", body = ErrorSchema),
        (status = 409, description = "Name or mount point taken", body = ErrorSchema),
        (status = 503, description = "Storage unavailable or timed out", body = ErrorSchema)
    ),
    tags = ["aliases"],
    operation_id = "createAlias"
)]
#[post("/aliases")]
pub async fn create_alias(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    payload: web::Json<CreateAliasRequest>,
) -> ApiResult<HttpResponse> {
    let context = session.require_context()?;
    let idempotency_key =
        extract_idempotency_key(request.headers()).map_err(map_idempotency_key_error)?;
    let mut command = payload.into_inner().into_domain(context)?;
    command.idempotency_key = idempotency_key;

    let created = state.bounded(state.aliases.create_alias(command)).await?;
    let mut response = if created.replayed {
        HttpResponse::Ok()
    } else {
        HttpResponse::Created()
    };
    Ok(response.json(created))
}
