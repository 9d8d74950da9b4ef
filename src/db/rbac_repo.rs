// src/db/rbac_repo.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::db_utils::with_timeout;
use crate::common::error::AppError;
use crate::db::ports::RoleCatalog;
use crate::models::rbac::Role;

// Catálogo de cargos (somente leitura; a manutenção é feita por outro fluxo)
#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
    timeout: Duration,
}

impl RoleRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl RoleCatalog for RoleRepository {
    // Listar todos os cargos (para o Frontend montar a tela)
    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, Role>("SELECT id, role_nome, descricao FROM roles ORDER BY id")
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        // O nome de máquina tem prioridade sobre a descrição
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, Role>(
                r#"
                SELECT id, role_nome, descricao
                FROM roles
                WHERE role_nome = $1 OR descricao = $1
                ORDER BY (role_nome = $1) DESC, id
                LIMIT 1
                "#,
            )
            .bind(name)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_role(&self, role_id: i32) -> Result<Option<Role>, AppError> {
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, Role>("SELECT id, role_nome, descricao FROM roles WHERE id = $1")
                .bind(role_id)
                .fetch_optional(&self.pool),
        )
        .await
    }
}
