// src/handlers/users.rs

use axum::{
    extract::{Path, Query, State},
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
    models::rbac::{ApprovePayload, GrantResponse, UserAccessDetail, UserListQuery, UserSummary},
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Usuários com o status resolvido", body = [UserSummary])
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let users = app_state
        .user_service
        .list_users(query.status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(users))
}

// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    tag = "Users",
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Usuário, status resolvido e concessões", body = UserAccessDetail),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_user(
    State(app_state): State<AppState>,
    locale: Locale,
    _admin: RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .user_service
        .user_detail(user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

// POST /api/users/{id}/approve
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/approve",
    tag = "Approval",
    request_body = ApprovePayload,
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Usuário aprovado; concessão geral do nível pedido", body = GrantResponse),
        (status = 404, description = "Nível de permissão ou usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_user(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<ApprovePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    tracing::info!(
        "Admin {} aprovando usuário {} como '{}'",
        admin.0.sub,
        user_id,
        payload.role_level_name
    );

    let grant = app_state
        .approval_service
        .approve(user_id, &payload.role_level_name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(GrantResponse::from(&grant)))
}

// POST /api/users/{id}/revoke
#[utoipa::path(
    post,
    path = "/api/users/{user_id}/revoke",
    tag = "Approval",
    params(("user_id" = Uuid, Path, description = "ID do Usuário")),
    responses(
        (status = 200, description = "Todas as concessões removidas; status volta a pendente"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn revoke_user(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Admin {} revogando o acesso de {}", admin.0.sub, user_id);

    let removed = app_state
        .approval_service
        .remove_all_access(user_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "removed": removed }))))
}
