// src/services/grant_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::{AppError, OrgUnitKind};
use crate::db::{GrantStore, OrgUnitDirectory, RoleCatalog, UserStore};
use crate::models::rbac::{Grant, GrantKey, GrantOutcome, Scope, ScopeRequest};
use crate::services::compensation::{Compensation, Undo};

/// Concessão e remoção pontual de um cargo, geral ou restrito a uma unidade.
#[derive(Clone)]
pub struct GrantService {
    grants: Arc<dyn GrantStore>,
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleCatalog>,
    org_units: Arc<dyn OrgUnitDirectory>,
}

impl GrantService {
    pub fn new(
        grants: Arc<dyn GrantStore>,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleCatalog>,
        org_units: Arc<dyn OrgUnitDirectory>,
    ) -> Self {
        Self {
            grants,
            users,
            roles,
            org_units,
        }
    }

    /// Converte os dois campos opcionais da API no escopo canônico, conferindo
    /// as unidades no diretório.
    ///
    /// Supervisão e coordenação juntas só valem se a supervisão for mesmo
    /// filha daquela coordenação; o escopo resultante é a supervisão.
    pub async fn resolve_scope(&self, request: ScopeRequest) -> Result<Scope, AppError> {
        let supervision = match request.supervision_id {
            Some(id) => Some(self.org_units.get_supervision(id).await?.ok_or(
                AppError::UnknownScope {
                    kind: OrgUnitKind::Supervision,
                    id,
                },
            )?),
            None => None,
        };

        if let Some(id) = request.coordination_id {
            self.org_units
                .get_coordination(id)
                .await?
                .ok_or(AppError::UnknownScope {
                    kind: OrgUnitKind::Coordination,
                    id,
                })?;
        }

        match (request.coordination_id, supervision) {
            (None, None) => Ok(Scope::General),
            (Some(coordination_id), None) => Ok(Scope::Coordination(coordination_id)),
            (None, Some(supervision)) => Ok(Scope::Supervision(supervision.id)),
            (Some(coordination_id), Some(supervision)) => {
                if supervision.coordenacao_id != Some(coordination_id) {
                    return Err(AppError::ScopeMismatch {
                        coordination_id,
                        supervision_id: supervision.id,
                    });
                }
                Ok(Scope::Supervision(supervision.id))
            }
        }
    }

    pub async fn list_grants(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        self.grants.list_grants_for_user(user_id).await
    }

    /// Concede `role_id` ao usuário no escopo pedido.
    ///
    /// Duplicata não é erro: devolve `GrantOutcome::AlreadyGranted` com a
    /// concessão existente. Uma nova concessão deixa o status gravado `ativo`.
    pub async fn add_grant(
        &self,
        user_id: Uuid,
        role_id: i32,
        scope: ScopeRequest,
    ) -> Result<GrantOutcome, AppError> {
        // 1. Escopo (nenhuma escrita acontece se a unidade não existir)
        let scope = self.resolve_scope(scope).await?;

        // 2. Cargo e usuário
        self.roles
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(role_id.to_string()))?;

        self.users
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        // 3. Insere direto; a constraint única decide se é duplicata
        let key = GrantKey::new(user_id, role_id, scope);
        let grant = match self.grants.create_grant(key).await {
            Ok(grant) => grant,
            Err(AppError::DuplicateGrant) => {
                let existing = self
                    .grants
                    .list_grants_for_user(user_id)
                    .await?
                    .into_iter()
                    .find(|g| g.key() == key);

                // Removida entre o INSERT e a leitura: informa a duplicata como veio
                let Some(grant) = existing else {
                    return Err(AppError::DuplicateGrant);
                };

                // Linhas antigas podem ter concessão com status desatualizado
                self.users.sync_status(user_id).await?;
                tracing::info!(
                    "ℹ️ Usuário {} já possui o cargo {} no escopo {:?}",
                    user_id,
                    role_id,
                    scope
                );
                return Ok(GrantOutcome::AlreadyGranted(grant));
            }
            Err(e) => return Err(e),
        };

        // 4. Status gravado acompanha as concessões
        if let Err(e) = self.users.sync_status(user_id).await {
            let mut compensation = Compensation::new(self.grants.as_ref());
            compensation.record(Undo::Delete(key));
            return Err(compensation.rollback(e).await);
        }

        tracing::info!(
            "✅ Cargo {} concedido ao usuário {} no escopo {:?}",
            role_id,
            user_id,
            scope
        );
        Ok(GrantOutcome::Created(grant))
    }

    /// Remove a concessão que bate exatamente com `(user_id, role_id, escopo)`.
    ///
    /// Para remover a concessão geral, o escopo vem vazio: ele é comparado
    /// como valor, nunca como "qualquer escopo". Retorna quantas foram removidas.
    pub async fn remove_grant(
        &self,
        user_id: Uuid,
        role_id: i32,
        scope: ScopeRequest,
    ) -> Result<u64, AppError> {
        let scope = self.resolve_scope(scope).await?;
        let key = GrantKey::new(user_id, role_id, scope);

        let removed = self.grants.delete_grant(key).await?;
        if removed == 0 {
            return Ok(0);
        }

        // Sem concessões restantes o usuário volta a `pendente`
        if let Err(e) = self.users.sync_status(user_id).await {
            let mut compensation = Compensation::new(self.grants.as_ref());
            compensation.record(Undo::Restore(key));
            return Err(compensation.rollback(e).await);
        }

        tracing::info!(
            "🗑️ Cargo {} removido do usuário {} no escopo {:?}",
            role_id,
            user_id,
            scope
        );
        Ok(removed)
    }
}
