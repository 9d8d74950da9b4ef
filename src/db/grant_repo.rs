// src/db/grant_repo.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::db_utils::with_timeout;
use crate::common::error::{AppError, OrgUnitKind};
use crate::db::ports::GrantStore;
use crate::models::rbac::{GeneralReplacement, Grant, GrantKey, GrantRow, Scope};

const GRANT_COLUMNS: &str =
    "id, user_id, role_id, coordenacao_id, supervisao_tecnica_id, created_at";

// Repositório da tabela 'usuario_roles'
#[derive(Clone)]
pub struct GrantRepository {
    pool: PgPool,
    timeout: Duration,
}

impl GrantRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

fn into_grants(rows: Vec<GrantRow>) -> Result<Vec<Grant>, AppError> {
    rows.into_iter()
        .map(|row| Grant::try_from(row).map_err(AppError::from))
        .collect()
}

// Converte violações de constraint do INSERT em erros de domínio
fn map_insert_error(err: AppError, key: &GrantKey) -> AppError {
    let AppError::DatabaseError(sqlx::Error::Database(db_err)) = &err else {
        return err;
    };

    if db_err.is_unique_violation() {
        return AppError::DuplicateGrant;
    }

    if db_err.is_foreign_key_violation() {
        let (coordination_id, supervision_id) = key.scope.to_columns();
        match (db_err.constraint(), coordination_id, supervision_id) {
            (Some("usuario_roles_role_id_fkey"), _, _) => {
                return AppError::RoleNotFound(key.role_id.to_string());
            }
            (Some("usuario_roles_coordenacao_id_fkey"), Some(id), _) => {
                return AppError::UnknownScope {
                    kind: OrgUnitKind::Coordination,
                    id,
                };
            }
            (Some("usuario_roles_supervisao_tecnica_id_fkey"), _, Some(id)) => {
                return AppError::UnknownScope {
                    kind: OrgUnitKind::Supervision,
                    id,
                };
            }
            (Some("usuario_roles_user_id_fkey"), _, _) => return AppError::UserNotFound,
            _ => {}
        }
    }

    err
}

#[async_trait]
impl GrantStore for GrantRepository {
    async fn list_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError> {
        let sql = format!("SELECT {GRANT_COLUMNS} FROM usuario_roles WHERE user_id = $1");
        let rows = with_timeout(
            self.timeout,
            sqlx::query_as::<_, GrantRow>(&sql)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await?;

        into_grants(rows)
    }

    // Uma consulta só para a listagem filtrada de usuários
    async fn list_grants_for_users(&self, user_ids: &[Uuid]) -> Result<Vec<Grant>, AppError> {
        let sql = format!("SELECT {GRANT_COLUMNS} FROM usuario_roles WHERE user_id = ANY($1)");
        let rows = with_timeout(
            self.timeout,
            sqlx::query_as::<_, GrantRow>(&sql)
                .bind(user_ids)
                .fetch_all(&self.pool),
        )
        .await?;

        into_grants(rows)
    }

    async fn create_grant(&self, key: GrantKey) -> Result<Grant, AppError> {
        let (coordenacao_id, supervisao_tecnica_id) = key.scope.to_columns();
        let sql = format!(
            r#"
            INSERT INTO usuario_roles (user_id, role_id, coordenacao_id, supervisao_tecnica_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {GRANT_COLUMNS}
            "#
        );

        // Sem checagem prévia: quem decide a duplicata é a constraint única
        let row = with_timeout(
            self.timeout,
            sqlx::query_as::<_, GrantRow>(&sql)
                .bind(key.user_id)
                .bind(key.role_id)
                .bind(coordenacao_id)
                .bind(supervisao_tecnica_id)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| map_insert_error(e, &key))?;

        Ok(Grant::try_from(row)?)
    }

    async fn delete_grant(&self, key: GrantKey) -> Result<u64, AppError> {
        let (coordenacao_id, supervisao_tecnica_id) = key.scope.to_columns();

        // IS NOT DISTINCT FROM: NULL casa com NULL e com mais nada
        let result = with_timeout(
            self.timeout,
            sqlx::query(
                r#"
                DELETE FROM usuario_roles
                WHERE user_id = $1
                  AND role_id = $2
                  AND coordenacao_id IS NOT DISTINCT FROM $3
                  AND supervisao_tecnica_id IS NOT DISTINCT FROM $4
                "#,
            )
            .bind(key.user_id)
            .bind(key.role_id)
            .bind(coordenacao_id)
            .bind(supervisao_tecnica_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_all_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError> {
        let sql = format!("DELETE FROM usuario_roles WHERE user_id = $1 RETURNING {GRANT_COLUMNS}");
        let rows = with_timeout(
            self.timeout,
            sqlx::query_as::<_, GrantRow>(&sql)
                .bind(user_id)
                .fetch_all(&self.pool),
        )
        .await?;

        into_grants(rows)
    }

    async fn replace_general_grant(
        &self,
        user_id: Uuid,
        role_id: i32,
    ) -> Result<GeneralReplacement, AppError> {
        let key = GrantKey::new(user_id, role_id, Scope::General);
        let insert_sql = format!(
            r#"
            INSERT INTO usuario_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT usuario_roles_concessao_unica DO NOTHING
            RETURNING {GRANT_COLUMNS}
            "#
        );
        let existing_sql = format!(
            r#"
            SELECT {GRANT_COLUMNS} FROM usuario_roles
            WHERE user_id = $1 AND role_id = $2
              AND coordenacao_id IS NULL AND supervisao_tecnica_id IS NULL
            "#
        );
        let delete_sql = format!(
            r#"
            DELETE FROM usuario_roles
            WHERE user_id = $1 AND role_id <> $2
              AND coordenacao_id IS NULL AND supervisao_tecnica_id IS NULL
            RETURNING {GRANT_COLUMNS}
            "#
        );

        // Uma transação, com a linha do usuário travada: duas aprovações do
        // mesmo usuário rodam uma depois da outra
        let outcome = with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM usuarios WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
            if locked.is_none() {
                return Ok::<_, sqlx::Error>(None);
            }

            let inserted = sqlx::query_as::<_, GrantRow>(&insert_sql)
                .bind(user_id)
                .bind(role_id)
                .fetch_optional(&mut *tx)
                .await?;
            let created = inserted.is_some();
            let grant = match inserted {
                Some(row) => row,
                None => {
                    sqlx::query_as::<_, GrantRow>(&existing_sql)
                        .bind(user_id)
                        .bind(role_id)
                        .fetch_one(&mut *tx)
                        .await?
                }
            };

            let removed = sqlx::query_as::<_, GrantRow>(&delete_sql)
                .bind(user_id)
                .bind(role_id)
                .fetch_all(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(Some((grant, created, removed)))
        })
        .await
        .map_err(|e| map_insert_error(e, &key))?;

        let (grant, created, removed) = outcome.ok_or(AppError::UserNotFound)?;
        Ok(GeneralReplacement {
            grant: Grant::try_from(grant)?,
            created,
            removed: into_grants(removed)?,
        })
    }
}

// Rodam contra um Postgres de verdade (15+): `cargo test -- --ignored`
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ports::UserStore;
    use crate::db::user_repo::UserRepository;
    use crate::models::auth::UserStatus;
    use sqlx::postgres::PgPoolOptions;

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .expect("falha ao conectar");
        sqlx::migrate!().run(&pool).await.expect("falha nas migrações");
        pool
    }

    async fn seed_user(pool: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO usuarios (id, nome, email, status) VALUES ($1, 'Teste', $2, 'pendente')")
            .bind(id)
            .bind(format!("{id}@teste.gov.br"))
            .execute(pool)
            .await
            .unwrap();
        id
    }

    async fn seed_coordination(pool: &PgPool) -> Uuid {
        sqlx::query_scalar("INSERT INTO coordenacoes (descricao) VALUES ('Zeladoria') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    async fn role_id(pool: &PgPool, name: &str) -> i32 {
        sqlx::query_scalar("SELECT id FROM roles WHERE role_nome = $1")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn repo(pool: &PgPool) -> GrantRepository {
        GrantRepository::new(pool.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    #[ignore = "Requires database - run locally with DATABASE_URL"]
    async fn duplicate_general_grant_hits_the_unique_constraint() {
        let pool = pool().await;
        let repo = repo(&pool);
        let user_id = seed_user(&pool).await;
        let key = GrantKey::new(user_id, role_id(&pool, "leitor").await, Scope::General);

        repo.create_grant(key).await.unwrap();
        let err = repo.create_grant(key).await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateGrant));
        assert_eq!(repo.list_grants_for_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    #[ignore = "Requires database - run locally with DATABASE_URL"]
    async fn general_delete_leaves_the_scoped_row() {
        let pool = pool().await;
        let repo = repo(&pool);
        let user_id = seed_user(&pool).await;
        let coordination_id = seed_coordination(&pool).await;
        let leitor = role_id(&pool, "leitor").await;

        repo.create_grant(GrantKey::new(user_id, leitor, Scope::General)).await.unwrap();
        repo.create_grant(GrantKey::new(user_id, leitor, Scope::Coordination(coordination_id)))
            .await
            .unwrap();

        let removed = repo
            .delete_grant(GrantKey::new(user_id, leitor, Scope::General))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        let left = repo.list_grants_for_user(user_id).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].scope, Scope::Coordination(coordination_id));
    }

    #[tokio::test]
    #[ignore = "Requires database - run locally with DATABASE_URL"]
    async fn unknown_coordination_maps_to_unknown_scope() {
        let pool = pool().await;
        let repo = repo(&pool);
        let user_id = seed_user(&pool).await;
        let missing = Uuid::new_v4();

        let err = repo
            .create_grant(GrantKey::new(
                user_id,
                role_id(&pool, "leitor").await,
                Scope::Coordination(missing),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AppError::UnknownScope { kind: OrgUnitKind::Coordination, id } if id == missing
        ));
    }

    #[tokio::test]
    #[ignore = "Requires database - run locally with DATABASE_URL"]
    async fn unknown_role_maps_to_role_not_found() {
        let pool = pool().await;
        let repo = repo(&pool);
        let user_id = seed_user(&pool).await;

        let err = repo
            .create_grant(GrantKey::new(user_id, 999_999, Scope::General))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::RoleNotFound(_)));
    }

    #[tokio::test]
    #[ignore = "Requires database - run locally with DATABASE_URL"]
    async fn concurrent_replacements_leave_one_general_grant() {
        let pool = pool().await;
        let repo = repo(&pool);
        let user_id = seed_user(&pool).await;
        let leitor = role_id(&pool, "leitor").await;
        let admin = role_id(&pool, "admin").await;

        let (a, b) = tokio::join!(
            repo.replace_general_grant(user_id, leitor),
            repo.replace_general_grant(user_id, admin)
        );
        assert!(a.is_ok() && b.is_ok());

        let general: Vec<_> = repo
            .list_grants_for_user(user_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|g| g.scope.is_general())
            .collect();
        assert_eq!(general.len(), 1);
    }

    #[tokio::test]
    #[ignore = "Requires database - run locally with DATABASE_URL"]
    async fn delete_all_returns_the_removed_rows_and_sync_resets_status() {
        let pool = pool().await;
        let repo = repo(&pool);
        let users = UserRepository::new(pool.clone(), Duration::from_secs(5));
        let user_id = seed_user(&pool).await;
        let coordination_id = seed_coordination(&pool).await;
        let leitor = role_id(&pool, "leitor").await;

        repo.create_grant(GrantKey::new(user_id, leitor, Scope::General)).await.unwrap();
        repo.create_grant(GrantKey::new(user_id, leitor, Scope::Coordination(coordination_id)))
            .await
            .unwrap();
        assert_eq!(users.sync_status(user_id).await.unwrap(), UserStatus::Ativo);

        let removed = repo.delete_all_grants_for_user(user_id).await.unwrap();

        assert_eq!(removed.len(), 2);
        assert_eq!(users.sync_status(user_id).await.unwrap(), UserStatus::Pendente);
    }
}
