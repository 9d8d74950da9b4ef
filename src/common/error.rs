use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Tipo de unidade organizacional citada num erro de escopo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgUnitKind {
    Coordination,
    Supervision,
}

impl OrgUnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgUnitKind::Coordination => "coordenacao",
            OrgUnitKind::Supervision => "supervisao_tecnica",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Concessão já existe")]
    DuplicateGrant,

    #[error("Unidade organizacional não encontrada: {} {id}", .kind.as_str())]
    UnknownScope { kind: OrgUnitKind, id: Uuid },

    #[error("Supervisão {supervision_id} não pertence à coordenação {coordination_id}")]
    ScopeMismatch {
        coordination_id: Uuid,
        supervision_id: Uuid,
    },

    #[error("Nível de permissão não encontrado: {0}")]
    RoleNotFound(String),

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    // As concessões mudaram, o status gravado não acompanhou e a compensação falhou
    #[error("Status do usuário fora de sincronia: {0}")]
    StatusSyncFailed(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Tempo limite da operação no banco de dados esgotado")]
    PersistenceTimeout,

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Tipo legível por máquina, exposto no JSON de erro.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::DuplicateGrant => "duplicate_grant",
            AppError::UnknownScope { .. } => "unknown_scope",
            AppError::ScopeMismatch { .. } => "scope_mismatch",
            AppError::RoleNotFound(_) => "role_not_found",
            AppError::UserNotFound => "user_not_found",
            AppError::InvalidToken => "invalid_token",
            AppError::Forbidden => "forbidden",
            AppError::StatusSyncFailed(_) => "status_sync_failed",
            AppError::DatabaseError(_) | AppError::PersistenceTimeout => "persistence",
            AppError::InternalServerError(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateGrant => StatusCode::CONFLICT,
            AppError::UnknownScope { .. } | AppError::ScopeMismatch { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::RoleNotFound(_) | AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::PersistenceTimeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StatusSyncFailed(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio na resposta da API, com a mensagem no idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status_code();
        let kind = self.kind();
        let error = i18n.message(&locale.0, kind).to_string();

        let details = match &self {
            // Retorna todos os detalhes da validação, campo a campo
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            AppError::UnknownScope { kind, id } => Some(json!({ "tipo": kind.as_str(), "id": id })),
            AppError::ScopeMismatch {
                coordination_id,
                supervision_id,
            } => Some(json!({
                "coordinationId": coordination_id,
                "supervisionId": supervision_id,
            })),
            AppError::RoleNotFound(name) => Some(json!({ "roleLevelName": name })),

            // O detalhe técnico fica só no log
            AppError::StatusSyncFailed(_)
            | AppError::DatabaseError(_)
            | AppError::PersistenceTimeout
            | AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {:?}", self);
                None
            }
            _ => None,
        };

        ApiError {
            status,
            error,
            kind: kind.to_string(),
            details,
        }
    }
}

// Erro já pronto para ir ao cliente
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub kind: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "kind": self.kind,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Usado onde não há Locale à mão (middlewares): responde em português.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}
