// src/services/user_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{GrantStore, OrgUnitDirectory, RoleCatalog, UserStore};
use crate::models::auth::UserStatus;
use crate::models::org::{Coordination, Supervision};
use crate::models::rbac::{Grant, GrantView, Role, Scope, UserAccessDetail, UserSummary};
use crate::services::access_status::resolve_status;

// Leitura: usuários com status resolvido e concessões prontas para a tela
#[derive(Clone)]
pub struct UserService {
    grants: Arc<dyn GrantStore>,
    users: Arc<dyn UserStore>,
    roles: Arc<dyn RoleCatalog>,
    org_units: Arc<dyn OrgUnitDirectory>,
}

impl UserService {
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

    /// Lista os usuários com o status de exibição, opcionalmente filtrando por ele.
    pub async fn list_users(&self, status: Option<UserStatus>) -> Result<Vec<UserSummary>, AppError> {
        let users = self.users.list_users().await?;
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        let mut grants_by_user: HashMap<Uuid, Vec<Grant>> = HashMap::new();
        for grant in self.grants.list_grants_for_users(&ids).await? {
            grants_by_user.entry(grant.user_id).or_default().push(grant);
        }

        let summaries = users
            .into_iter()
            .map(|user| {
                let grants = grants_by_user.get(&user.id).map(Vec::as_slice).unwrap_or(&[]);
                let resolved_status = resolve_status(&user, grants);
                UserSummary {
                    user,
                    resolved_status,
                }
            })
            .filter(|s| status.is_none_or(|wanted| s.resolved_status == wanted))
            .collect();

        Ok(summaries)
    }

    pub async fn user_detail(&self, user_id: Uuid) -> Result<UserAccessDetail, AppError> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let grants = self.grants.list_grants_for_user(user_id).await?;
        let resolved_status = resolve_status(&user, &grants);
        let grants = self.grant_views(&grants).await?;

        Ok(UserAccessDetail {
            user,
            resolved_status,
            grants,
        })
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        self.roles.list_roles().await
    }

    /// O usuário tem concessão *geral* do cargo `admin_role_name`?
    pub async fn is_admin(&self, user_id: Uuid, admin_role_name: &str) -> Result<bool, AppError> {
        let Some(admin) = self.roles.find_role_by_name(admin_role_name).await? else {
            tracing::warn!("Cargo administrativo '{}' não existe no catálogo", admin_role_name);
            return Ok(false);
        };

        let grants = self.grants.list_grants_for_user(user_id).await?;
        Ok(grants
            .iter()
            .any(|g| g.role_id == admin.id && g.scope.is_general()))
    }

    /// Enriquece as concessões com nomes de cargo e unidades. Uma concessão
    /// de supervisão mostra também a coordenação-mãe.
    pub async fn grant_views(&self, grants: &[Grant]) -> Result<Vec<GrantView>, AppError> {
        let roles: HashMap<i32, Role> = self
            .roles
            .list_roles()
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        let mut coordinations: HashMap<Uuid, Option<Coordination>> = HashMap::new();
        let mut supervisions: HashMap<Uuid, Option<Supervision>> = HashMap::new();
        let mut views = Vec::with_capacity(grants.len());

        for grant in grants {
            let (coordination_id, supervision) = match grant.scope {
                Scope::General => (None, None),
                Scope::Coordination(id) => (Some(id), None),
                Scope::Supervision(id) => {
                    if !supervisions.contains_key(&id) {
                        let found = self.org_units.get_supervision(id).await?;
                        supervisions.insert(id, found);
                    }
                    let supervision = supervisions.get(&id).cloned().flatten();
                    let parent = supervision.as_ref().and_then(|s| s.coordenacao_id);
                    (parent, Some((id, supervision)))
                }
            };

            let coordination_descricao = match coordination_id {
                Some(id) => {
                    if !coordinations.contains_key(&id) {
                        let found = self.org_units.get_coordination(id).await?;
                        coordinations.insert(id, found);
                    }
                    coordinations
                        .get(&id)
                        .and_then(|c| c.as_ref())
                        .map(|c| c.descricao.clone())
                }
                None => None,
            };

            let role = roles.get(&grant.role_id);
            views.push(GrantView {
                id: grant.id,
                role_id: grant.role_id,
                role_nome: role.map(|r| r.role_nome.clone()),
                role_descricao: role.map(|r| r.descricao.clone()),
                general: grant.scope.is_general(),
                coordination_id,
                coordination_descricao,
                supervision_id: supervision.as_ref().map(|(id, _)| *id),
                supervision_descricao: supervision
                    .and_then(|(_, s)| s)
                    .map(|s| s.descricao),
                created_at: grant.created_at,
            });
        }

        Ok(views)
    }
}
