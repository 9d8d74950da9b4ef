use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::db_utils::with_timeout;
use crate::common::error::AppError;
use crate::db::ports::UserStore;
use crate::models::auth::{User, UserStatus};

const USER_COLUMNS: &str = "id, nome, email, email_verificado, status, created_at, updated_at";

// O repositório de usuários. A tabela 'usuarios' é alimentada pelo provedor de
// identidade; daqui só se lê e se atualiza o status.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl UserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    // Busca um usuário pelo seu ID
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios WHERE id = $1");
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, User>(&sql)
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios ORDER BY nome");
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool),
        )
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios WHERE lower(email) = lower($1)");
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn sync_status(&self, user_id: Uuid) -> Result<UserStatus, AppError> {
        // A trava na linha do usuário serializa as sincronizações; o UPDATE,
        // por ser uma nova instrução, já enxerga as concessões confirmadas
        let status = with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM usuarios WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
            if locked.is_none() {
                return Ok::<_, sqlx::Error>(None);
            }

            let status = sqlx::query_scalar::<_, UserStatus>(
                r#"
                UPDATE usuarios
                SET status = CASE
                        WHEN EXISTS (SELECT 1 FROM usuario_roles WHERE user_id = $1)
                            THEN 'ativo'::status_usuario
                        ELSE 'pendente'::status_usuario
                    END,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING status
                "#,
            )
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(Some(status))
        })
        .await?
        .ok_or(AppError::UserNotFound)?;

        tracing::info!("👤 Status do usuário {} sincronizado: {:?}", user_id, status);
        Ok(status)
    }
}
