// src/services/approval_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{GrantStore, RoleCatalog, UserStore};
use crate::models::rbac::Grant;
use crate::services::compensation::{Compensation, Undo};

/// As duas transições de ponta do ciclo de acesso: aprovar e revogar tudo.
#[derive(Clone)]
pub struct ApprovalService {
    grants: Arc<dyn GrantStore>,
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleCatalog>,
}

impl ApprovalService {
    pub fn new(
        grants: Arc<dyn GrantStore>,
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleCatalog>,
    ) -> Self {
        Self {
            grants,
            users,
            roles,
        }
    }

    /// LÓGICA DE NEGÓCIO: aprova o usuário no nível `role_level_name`.
    ///
    /// Ao final o usuário tem exatamente uma concessão geral, a do nível
    /// pedido; concessões contextuais não são tocadas. Aprovar de novo no
    /// mesmo nível devolve a concessão existente.
    pub async fn approve(&self, user_id: Uuid, role_level_name: &str) -> Result<Grant, AppError> {
        // 1. Resolve o nível no catálogo
        let role = self
            .roles
            .find_role_by_name(role_level_name)
            .await?
            .ok_or_else(|| AppError::RoleNotFound(role_level_name.to_string()))?;

        // 2. Troca o nível geral de uma vez (garante o novo, remove os outros)
        let replacement = self.grants.replace_general_grant(user_id, role.id).await?;

        let mut compensation = Compensation::new(self.grants.as_ref());
        if replacement.created {
            compensation.record(Undo::Delete(replacement.grant.key()));
        }
        for previous in &replacement.removed {
            compensation.record(Undo::Restore(previous.key()));
            tracing::info!(
                "🔁 Nível geral {} substituído por {} para o usuário {}",
                previous.role_id,
                role.id,
                user_id
            );
        }

        // 3. Status gravado
        if let Err(e) = self.users.sync_status(user_id).await {
            return Err(compensation.rollback(e).await);
        }

        tracing::info!(
            "✅ Usuário {} aprovado com o nível '{}'",
            user_id,
            role.role_nome
        );
        Ok(replacement.grant)
    }

    /// Promove o usuário do e-mail informado a administrador geral, se ele
    /// ainda não for. Usuário inexistente só gera um aviso: o provedor de
    /// identidade pode ainda não ter criado a conta.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        admin_role_name: &str,
    ) -> Result<Option<Grant>, AppError> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            tracing::warn!("⚠️ Administrador inicial {} ainda não existe", email);
            return Ok(None);
        };

        let grant = self.approve(user.id, admin_role_name).await?;
        tracing::info!("🔑 Usuário {} ({}) é o administrador inicial", user.id, email);
        Ok(Some(grant))
    }

    /// Remove todas as concessões do usuário e recalcula o status (`pendente`).
    ///
    /// Ordem: primeiro as concessões, depois o status. Se a remoção falhar o
    /// status não muda; se o status falhar, as linhas removidas são recriadas.
    pub async fn remove_all_access(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let removed = self.grants.delete_all_grants_for_user(user_id).await?;

        if let Err(e) = self.users.sync_status(user_id).await {
            let mut compensation = Compensation::new(self.grants.as_ref());
            for grant in &removed {
                compensation.record(Undo::Restore(grant.key()));
            }
            return Err(compensation.rollback(e).await);
        }

        tracing::info!(
            "🚫 Acesso do usuário {} removido ({} concessões)",
            user_id,
            removed.len()
        );
        Ok(removed.len() as u64)
    }
}
