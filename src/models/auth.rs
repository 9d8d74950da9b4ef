// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Ciclo de vida da conta. O valor gravado vive na coluna `usuarios.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_usuario", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    AguardandoEmail,
    Pendente,
    Ativo,
}

// Representa um usuário vindo do banco de dados.
// A identidade pertence ao provedor de autenticação; aqui só lemos e gravamos o status.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    #[schema(example = "Maria Souza")]
    pub nome: String,

    #[schema(example = "maria.souza@prefeitura.sp.gov.br")]
    pub email: String,

    pub email_verificado: bool,

    pub status: UserStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor de identidade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário)
    pub exp: usize, // Expiration time (quando o token expira)
    pub iat: usize, // Issued At (quando o token foi criado)
}
