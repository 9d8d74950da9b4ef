// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::users::list_users,
        handlers::users::get_user,

        // --- Approval ---
        handlers::users::approve_user,
        handlers::users::revoke_user,

        // --- Grants ---
        handlers::grants::list_grants,
        handlers::grants::add_grant,
        handlers::grants::remove_grant,

        // --- RBAC ---
        handlers::rbac::list_roles,
    ),
    components(
        schemas(
            // --- Users ---
            models::auth::UserStatus,
            models::auth::User,
            models::rbac::UserSummary,
            models::rbac::UserAccessDetail,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::ScopeRequest,
            models::rbac::GrantPayload,
            models::rbac::ApprovePayload,
            models::rbac::GrantResponse,
            models::rbac::AddGrantResponse,
            models::rbac::GrantView,

            // --- Org ---
            models::org::Coordination,
            models::org::Supervision,
        )
    ),
    tags(
        (name = "Users", description = "Usuários e status de acesso"),
        (name = "Approval", description = "Aprovação e revogação total de acesso"),
        (name = "Grants", description = "Concessões gerais e contextuais"),
        (name = "RBAC", description = "Catálogo de cargos")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
