//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every panel endpoint, the request/response bodies and
//! the schema wrappers from [`crate::inbound::http::schemas`] that describe
//! domain types without deriving utoipa traits on them. The document is
//! served by Swagger UI in debug builds and printed by `openapi-dump`.

use crate::inbound::http::aliases::{CreateAliasRequest, ForwardBody};
use crate::inbound::http::auth::{LoginRequest, LoginResponse};
use crate::inbound::http::reseller::QuotaResponse;
use crate::inbound::http::schemas::{
    AliasCreatedSchema, AliasFormSchema, ErrorCodeSchema, ErrorSchema, ResellerOverviewSchema,
    UsageCountersSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the panel API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Reseller panel API",
        description = "Reseller quota ledger, domain alias provisioning and account overview."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::reseller::overview,
        crate::inbound::http::reseller::quota,
        crate::inbound::http::reseller::recompute_quota,
        crate::inbound::http::aliases::alias_form,
        crate::inbound::http::aliases::create_alias,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UsageCountersSchema,
        ResellerOverviewSchema,
        AliasFormSchema,
        AliasCreatedSchema,
        LoginRequest,
        LoginResponse,
        QuotaResponse,
        CreateAliasRequest,
        ForwardBody,
    )),
    tags(
        (name = "auth", description = "Reseller login and logout"),
        (name = "reseller", description = "Quota ledger and account overview"),
        (name = "aliases", description = "Domain alias provisioning"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
