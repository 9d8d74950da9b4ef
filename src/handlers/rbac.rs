// src/handlers/rbac.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::rbac::Role,
};

// GET /api/roles (Para o frontend montar o seletor de nível de permissão)
#[utoipa::path(
    get,
    path = "/api/roles",
    tag = "RBAC",
    responses(
        (status = 200, description = "Catálogo de cargos", body = [Role])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_roles(
    State(app_state): State<AppState>,
    locale: Locale,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let roles = app_state
        .user_service
        .list_roles()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(roles))
}
