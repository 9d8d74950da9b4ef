// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::{User, UserStatus};

// O que sai do banco (Tabela roles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = 2)]
    pub id: i32,

    #[schema(example = "leitor")]
    pub role_nome: String,

    #[schema(example = "Leitor")]
    pub descricao: String,
}

/// Escopo organizacional de uma concessão.
///
/// Só vira as duas colunas anuláveis (`coordenacao_id`, `supervisao_tecnica_id`)
/// na fronteira com o banco. A coordenação de uma supervisão é derivada pelo
/// diretório, nunca gravada junto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "tipo", content = "id", rename_all = "snake_case")]
pub enum Scope {
    General,
    Coordination(Uuid),
    Supervision(Uuid),
}

impl Scope {
    pub fn is_general(&self) -> bool {
        matches!(self, Scope::General)
    }

    /// Representação em colunas: `(coordenacao_id, supervisao_tecnica_id)`.
    pub fn to_columns(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Scope::General => (None, None),
            Scope::Coordination(id) => (Some(id), None),
            Scope::Supervision(id) => (None, Some(id)),
        }
    }

    /// Linhas com as duas colunas preenchidas são barradas pela CHECK do schema.
    pub fn from_columns(coordenacao_id: Option<Uuid>, supervisao_tecnica_id: Option<Uuid>) -> Option<Self> {
        match (coordenacao_id, supervisao_tecnica_id) {
            (None, None) => Some(Scope::General),
            (Some(c), None) => Some(Scope::Coordination(c)),
            (None, Some(s)) => Some(Scope::Supervision(s)),
            (Some(_), Some(_)) => None,
        }
    }
}

// Identidade de uma concessão: a tupla que a constraint única protege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GrantKey {
    pub user_id: Uuid,
    pub role_id: i32,
    pub scope: Scope,
}

impl GrantKey {
    pub fn new(user_id: Uuid, role_id: i32, scope: Scope) -> Self {
        Self { user_id, role_id, scope }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: i32,
    pub scope: Scope,
    pub created_at: DateTime<Utc>,
}

impl Grant {
    pub fn key(&self) -> GrantKey {
        GrantKey::new(self.user_id, self.role_id, self.scope)
    }
}

// O que sai do banco (Tabela usuario_roles)
#[derive(Debug, FromRow)]
pub struct GrantRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: i32,
    pub coordenacao_id: Option<Uuid>,
    pub supervisao_tecnica_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GrantRow> for Grant {
    type Error = anyhow::Error;

    fn try_from(row: GrantRow) -> Result<Self, Self::Error> {
        let scope = Scope::from_columns(row.coordenacao_id, row.supervisao_tecnica_id)
            .ok_or_else(|| anyhow::anyhow!("Concessão {} com coordenação e supervisão ao mesmo tempo", row.id))?;

        Ok(Grant {
            id: row.id,
            user_id: row.user_id,
            role_id: row.role_id,
            scope,
            created_at: row.created_at,
        })
    }
}

// Resultado de `add_grant`: duplicata não é falha, é um "já concedido".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Created(Grant),
    AlreadyGranted(Grant),
}

impl GrantOutcome {
    pub fn grant(&self) -> &Grant {
        match self {
            GrantOutcome::Created(g) | GrantOutcome::AlreadyGranted(g) => g,
        }
    }
}

// Resultado da troca do nível geral, feita de uma vez pelo armazenamento
#[derive(Debug, Clone)]
pub struct GeneralReplacement {
    pub grant: Grant,
    pub created: bool,
    // As outras concessões gerais que saíram
    pub removed: Vec<Grant>,
}

// ---
// Payloads
// ---

// Escopo como chega da API: dois campos opcionais. Ambos ausentes = concessão geral.
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRequest {
    pub coordination_id: Option<Uuid>,
    pub supervision_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantPayload {
    #[validate(range(min = 1, message = "O cargo informado é inválido."))]
    #[schema(example = 3)]
    pub role_id: i32,

    #[serde(flatten)]
    pub scope: ScopeRequest,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePayload {
    #[validate(length(min = 1, message = "O nível de permissão é obrigatório."))]
    #[schema(example = "leitor")]
    pub role_level_name: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Filtra pelo status resolvido (não pelo gravado)
    pub status: Option<UserStatus>,
}

// ---
// Respostas
// ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role_id: i32,
    pub coordination_id: Option<Uuid>,
    pub supervision_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&Grant> for GrantResponse {
    fn from(grant: &Grant) -> Self {
        let (coordination_id, supervision_id) = grant.scope.to_columns();
        Self {
            id: grant.id,
            user_id: grant.user_id,
            role_id: grant.role_id,
            coordination_id,
            supervision_id,
            created_at: grant.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddGrantResponse {
    pub grant: GrantResponse,

    #[schema(example = false)]
    pub already_granted: bool,
}

// Concessão pronta para exibição: nomes do cargo e das unidades resolvidos.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantView {
    pub id: Uuid,
    pub role_id: i32,
    pub role_nome: Option<String>,
    pub role_descricao: Option<String>,

    #[schema(example = true)]
    pub general: bool,

    // Para supervisões, é a coordenação-mãe (derivada)
    pub coordination_id: Option<Uuid>,
    pub coordination_descricao: Option<String>,
    pub supervision_id: Option<Uuid>,
    pub supervision_descricao: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,

    // Status de exibição (ver `resolve_status`)
    #[schema(example = json!("ativo"))]
    pub resolved_status: UserStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAccessDetail {
    #[serde(flatten)]
    pub user: User,

    pub resolved_status: UserStatus,

    pub grants: Vec<GrantView>,
}
