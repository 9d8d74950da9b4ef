// src/db/ports.rs
//
// Portas de persistência. Os serviços recebem `Arc<dyn ...>` e nunca falam
// com o pool diretamente; em produção as implementações são os repositórios
// Postgres deste módulo.

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::auth::{User, UserStatus};
use crate::models::org::{Coordination, Supervision};
use crate::models::rbac::{GeneralReplacement, Grant, GrantKey, Role};

/// Armazenamento das concessões.
///
/// A unicidade de `(user_id, role_id, escopo)` é garantida pelo próprio
/// armazenamento (constraint única), nunca por "consulta e depois insere".
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Todas as concessões do usuário, gerais e contextuais, sem ordem garantida.
    async fn list_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError>;

    async fn list_grants_for_users(&self, user_ids: &[Uuid]) -> Result<Vec<Grant>, AppError> {
        let mut grants = Vec::new();
        for user_id in user_ids {
            grants.extend(self.list_grants_for_user(*user_id).await?);
        }
        Ok(grants)
    }

    /// Falha com `AppError::DuplicateGrant` se a tupla já existir.
    async fn create_grant(&self, key: GrantKey) -> Result<Grant, AppError>;

    /// Remove as concessões que batem exatamente com a tupla. Escopo vazio
    /// casa só com escopo vazio: nada de curinga.
    async fn delete_grant(&self, key: GrantKey) -> Result<u64, AppError>;

    /// Remove tudo do usuário e devolve as linhas que saíram de fato.
    async fn delete_all_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError>;

    /// Deixa o usuário com uma única concessão geral, a de `role_id`, numa
    /// operação só: garante a concessão e remove as outras gerais. Chamadas
    /// concorrentes para o mesmo usuário são serializadas.
    async fn replace_general_grant(
        &self,
        user_id: Uuid,
        role_id: i32,
    ) -> Result<GeneralReplacement, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Recalcula o status gravado a partir das concessões atuais, numa
    /// instrução só: `ativo` com alguma concessão, `pendente` sem nenhuma.
    /// Falha com `AppError::UserNotFound` se o usuário não existir.
    async fn sync_status(&self, user_id: Uuid) -> Result<UserStatus, AppError>;
}

#[async_trait]
pub trait RoleCatalog: Send + Sync {
    async fn list_roles(&self) -> Result<Vec<Role>, AppError>;

    /// Procura pelo `role_nome` ou, se não houver, pela descrição.
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError>;

    async fn find_role(&self, role_id: i32) -> Result<Option<Role>, AppError>;
}

#[async_trait]
pub trait OrgUnitDirectory: Send + Sync {
    async fn get_coordination(&self, id: Uuid) -> Result<Option<Coordination>, AppError>;

    async fn get_supervision(&self, id: Uuid) -> Result<Option<Supervision>, AppError>;
}
