// src/handlers/grants.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, rbac::RequireAdmin},
    models::rbac::{AddGrantResponse, GrantOutcome, GrantPayload, GrantResponse, GrantView},
};

// GET /api/users/{id}/grants
#[utoipa::path(
    get,
    path = "/api/users/{user_id}/grants",
    tag = "Grants",
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Concessões gerais e contextuais do usuário", body = [GrantView]),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_grants(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let grants = app_state
        .grant_service
        .list_grants(user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let views = app_state
        .user_service
        .grant_views(&grants)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(views))
}

// POST /api/users/{id}/grants
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/grants",
    tag = "Grants",
    request_body = GrantPayload,
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 201, description = "Concessão criada", body = AddGrantResponse),
        (status = 200, description = "Concessão já existia", body = AddGrantResponse),
        (status = 422, description = "Coordenação ou supervisão inexistente, ou supervisão fora da coordenação")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_grant(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<GrantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let outcome = app_state
        .grant_service
        .add_grant(user_id, payload.role_id, payload.scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let (status, already_granted) = match outcome {
        GrantOutcome::Created(_) => (StatusCode::CREATED, false),
        GrantOutcome::AlreadyGranted(_) => (StatusCode::OK, true),
    };

    Ok((
        status,
        Json(AddGrantResponse {
            grant: GrantResponse::from(outcome.grant()),
            already_granted,
        }),
    ))
}

// DELETE /api/users/{id}/grants
#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/grants",
    tag = "Grants",
    request_body = GrantPayload,
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Quantidade removida (escopo comparado exatamente)")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_grant(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<GrantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let removed = app_state
        .grant_service
        .remove_grant(user_id, payload.role_id, payload.scope)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(json!({ "removed": removed })))
}
