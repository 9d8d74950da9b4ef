// src/models/org.rs

use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Unidade organizacional de topo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coordination {
    pub id: Uuid,

    #[schema(example = "Coordenação de Zeladoria")]
    pub descricao: String,
}

// Supervisão técnica. Pertence a no máximo uma coordenação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Supervision {
    pub id: Uuid,

    #[schema(example = "Supervisão de Limpeza Urbana")]
    pub descricao: String,

    pub coordenacao_id: Option<Uuid>,
}
