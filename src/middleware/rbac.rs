// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
};

/// Guardião das rotas administrativas: exige uma concessão *geral* do cargo
/// configurado em `ADMIN_ROLE_NAME`. Concessões contextuais não bastam.
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        // A. Extrai Usuário (colocado pelo auth_guard)
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Verifica no Banco
        let is_admin = app_state
            .user_service
            .is_admin(user.0.sub, &app_state.settings.admin_role_name)
            .await
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        if !is_admin {
            tracing::warn!("⛔ Usuário {} tentou uma ação administrativa", user.0.sub);
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireAdmin(user))
    }
}
