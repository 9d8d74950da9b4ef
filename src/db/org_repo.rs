// src/db/org_repo.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::db_utils::with_timeout;
use crate::common::error::AppError;
use crate::db::ports::OrgUnitDirectory;
use crate::models::org::{Coordination, Supervision};

// Leitura de coordenações e supervisões técnicas. O cadastro delas é de outro módulo.
#[derive(Clone)]
pub struct OrgUnitRepository {
    pool: PgPool,
    timeout: Duration,
}

impl OrgUnitRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl OrgUnitDirectory for OrgUnitRepository {
    async fn get_coordination(&self, id: Uuid) -> Result<Option<Coordination>, AppError> {
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, Coordination>("SELECT id, descricao FROM coordenacoes WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn get_supervision(&self, id: Uuid) -> Result<Option<Supervision>, AppError> {
        with_timeout(
            self.timeout,
            sqlx::query_as::<_, Supervision>(
                "SELECT id, descricao, coordenacao_id FROM supervisoes_tecnicas WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
    }
}
