// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Rotas protegidas: todas exigem o Bearer token; as administrativas
    // checam o cargo no próprio handler (RequireAdmin)
    let api_routes = Router::new()
        .route("/roles", get(handlers::rbac::list_roles))
        .route("/users", get(handlers::users::list_users))
        .route("/users/{user_id}", get(handlers::users::get_user))
        .route("/users/{user_id}/approve", post(handlers::users::approve_user))
        .route("/users/{user_id}/revoke", post(handlers::users::revoke_user))
        .route(
            "/users/{user_id}/grants",
            get(handlers::grants::list_grants)
                .post(handlers::grants::add_grant)
                .delete(handlers::grants::remove_grant),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .with_state(app_state)
}
