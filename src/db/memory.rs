// src/db/memory.rs
//
// Implementação em memória das quatro portas, para os testes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::ports::{GrantStore, OrgUnitDirectory, RoleCatalog, UserStore};
use crate::models::auth::{User, UserStatus};
use crate::models::org::{Coordination, Supervision};
use crate::models::rbac::{GeneralReplacement, Grant, GrantKey, Role, Scope};

#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    grants: RwLock<Vec<Grant>>,
    roles: RwLock<Vec<Role>>,
    coordinations: RwLock<HashMap<Uuid, Coordination>>,
    supervisions: RwLock<HashMap<Uuid, Supervision>>,

    // Injeção de falhas
    fail_sync_status: AtomicBool,
    fail_create_grant: AtomicBool,
    fail_delete_grants: AtomicBool,

    grant_writes: AtomicUsize,
}

fn injected_failure() -> AppError {
    AppError::DatabaseError(sqlx::Error::PoolTimedOut)
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, nome: &str, status: UserStatus) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            nome: nome.to_string(),
            email: format!("{}@prefeitura.gov.br", nome.to_lowercase()),
            email_verificado: status != UserStatus::AguardandoEmail,
            status,
            created_at: now,
            updated_at: now,
        };
        self.users.write().await.insert(user.id, user.clone());
        user
    }

    pub async fn seed_role(&self, role_nome: &str, descricao: &str) -> Role {
        let mut roles = self.roles.write().await;
        let role = Role {
            id: roles.len() as i32 + 1,
            role_nome: role_nome.to_string(),
            descricao: descricao.to_string(),
        };
        roles.push(role.clone());
        role
    }

    pub async fn seed_coordination(&self, descricao: &str) -> Coordination {
        let coordination = Coordination {
            id: Uuid::new_v4(),
            descricao: descricao.to_string(),
        };
        self.coordinations
            .write()
            .await
            .insert(coordination.id, coordination.clone());
        coordination
    }

    pub async fn seed_supervision(&self, descricao: &str, coordenacao_id: Option<Uuid>) -> Supervision {
        let supervision = Supervision {
            id: Uuid::new_v4(),
            descricao: descricao.to_string(),
            coordenacao_id,
        };
        self.supervisions
            .write()
            .await
            .insert(supervision.id, supervision.clone());
        supervision
    }

    pub async fn stored_status(&self, user_id: Uuid) -> Option<UserStatus> {
        self.users.read().await.get(&user_id).map(|u| u.status)
    }

    pub async fn grant_count(&self) -> usize {
        self.grants.read().await.len()
    }

    /// Quantas escritas (inserções e remoções) chegaram à tabela de concessões.
    pub fn grant_writes(&self) -> usize {
        self.grant_writes.load(Ordering::SeqCst)
    }

    pub fn fail_sync_status(&self, fail: bool) {
        self.fail_sync_status.store(fail, Ordering::SeqCst);
    }

    // Grava um status sem passar pela sincronização (linhas legadas)
    pub async fn force_status(&self, user_id: Uuid, status: UserStatus) {
        if let Some(user) = self.users.write().await.get_mut(&user_id) {
            user.status = status;
        }
    }

    pub fn fail_create_grant(&self, fail: bool) {
        self.fail_create_grant.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete_grants(&self, fail: bool) {
        self.fail_delete_grants.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl GrantStore for InMemoryStore {
    async fn list_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError> {
        let grants = self.grants.read().await;
        Ok(grants.iter().filter(|g| g.user_id == user_id).cloned().collect())
    }

    async fn create_grant(&self, key: GrantKey) -> Result<Grant, AppError> {
        if self.fail_create_grant.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }

        // A checagem acontece sob o mesmo lock da inserção, como a constraint única
        let mut grants = self.grants.write().await;
        if grants.iter().any(|g| g.key() == key) {
            return Err(AppError::DuplicateGrant);
        }

        let grant = Grant {
            id: Uuid::new_v4(),
            user_id: key.user_id,
            role_id: key.role_id,
            scope: key.scope,
            created_at: Utc::now(),
        };
        grants.push(grant.clone());
        self.grant_writes.fetch_add(1, Ordering::SeqCst);
        Ok(grant)
    }

    async fn delete_grant(&self, key: GrantKey) -> Result<u64, AppError> {
        if self.fail_delete_grants.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }

        let mut grants = self.grants.write().await;
        let before = grants.len();
        grants.retain(|g| g.key() != key);
        let removed = (before - grants.len()) as u64;
        if removed > 0 {
            self.grant_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    async fn delete_all_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError> {
        if self.fail_delete_grants.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }

        let mut grants = self.grants.write().await;
        let (removed, kept): (Vec<Grant>, Vec<Grant>) =
            grants.drain(..).partition(|g| g.user_id == user_id);
        *grants = kept;
        if !removed.is_empty() {
            self.grant_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    async fn replace_general_grant(
        &self,
        user_id: Uuid,
        role_id: i32,
    ) -> Result<GeneralReplacement, AppError> {
        if self.fail_create_grant.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }

        // Tudo sob o lock de escrita: equivale à transação com a linha travada
        let mut grants = self.grants.write().await;
        if !self.users.read().await.contains_key(&user_id) {
            return Err(AppError::UserNotFound);
        }

        let target = GrantKey::new(user_id, role_id, Scope::General);
        let existing = grants.iter().find(|g| g.key() == target).cloned();
        let (grant, created) = match existing {
            Some(existing) => (existing, false),
            None => {
                let grant = Grant {
                    id: Uuid::new_v4(),
                    user_id,
                    role_id,
                    scope: Scope::General,
                    created_at: Utc::now(),
                };
                grants.push(grant.clone());
                (grant, true)
            }
        };

        let (removed, kept): (Vec<Grant>, Vec<Grant>) = grants.drain(..).partition(|g| {
            g.user_id == user_id && g.scope.is_general() && g.role_id != role_id
        });
        *grants = kept;

        if created || !removed.is_empty() {
            self.grant_writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(GeneralReplacement {
            grant,
            created,
            removed,
        })
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn sync_status(&self, user_id: Uuid) -> Result<UserStatus, AppError> {
        if self.fail_sync_status.load(Ordering::SeqCst) {
            return Err(injected_failure());
        }

        // Mesma ordem de locks das escritas de concessão: grants, depois users
        let grants = self.grants.read().await;
        let mut users = self.users.write().await;
        let user = users.get_mut(&user_id).ok_or(AppError::UserNotFound)?;

        user.status = if grants.iter().any(|g| g.user_id == user_id) {
            UserStatus::Ativo
        } else {
            UserStatus::Pendente
        };
        user.updated_at = Utc::now();
        Ok(user.status)
    }
}

#[async_trait]
impl RoleCatalog for InMemoryStore {
    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        Ok(self.roles.read().await.clone())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let roles = self.roles.read().await;
        Ok(roles
            .iter()
            .find(|r| r.role_nome == name)
            .or_else(|| roles.iter().find(|r| r.descricao == name))
            .cloned())
    }

    async fn find_role(&self, role_id: i32) -> Result<Option<Role>, AppError> {
        Ok(self.roles.read().await.iter().find(|r| r.id == role_id).cloned())
    }
}

#[async_trait]
impl OrgUnitDirectory for InMemoryStore {
    async fn get_coordination(&self, id: Uuid) -> Result<Option<Coordination>, AppError> {
        Ok(self.coordinations.read().await.get(&id).cloned())
    }

    async fn get_supervision(&self, id: Uuid) -> Result<Option<Supervision>, AppError> {
        Ok(self.supervisions.read().await.get(&id).cloned())
    }
}

/// Embrulha o `InMemoryStore` cedendo a vez ao executor antes de cada
/// chamada, para que fluxos rodando com `tokio::join!` se intercalem.
pub struct Interleaved(pub Arc<InMemoryStore>);

#[async_trait]
impl GrantStore for Interleaved {
    async fn list_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError> {
        tokio::task::yield_now().await;
        self.0.list_grants_for_user(user_id).await
    }

    async fn create_grant(&self, key: GrantKey) -> Result<Grant, AppError> {
        tokio::task::yield_now().await;
        self.0.create_grant(key).await
    }

    async fn delete_grant(&self, key: GrantKey) -> Result<u64, AppError> {
        tokio::task::yield_now().await;
        self.0.delete_grant(key).await
    }

    async fn delete_all_grants_for_user(&self, user_id: Uuid) -> Result<Vec<Grant>, AppError> {
        tokio::task::yield_now().await;
        self.0.delete_all_grants_for_user(user_id).await
    }

    async fn replace_general_grant(
        &self,
        user_id: Uuid,
        role_id: i32,
    ) -> Result<GeneralReplacement, AppError> {
        tokio::task::yield_now().await;
        self.0.replace_general_grant(user_id, role_id).await
    }
}

#[async_trait]
impl UserStore for Interleaved {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        tokio::task::yield_now().await;
        self.0.find_user(user_id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        tokio::task::yield_now().await;
        self.0.list_users().await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        tokio::task::yield_now().await;
        self.0.find_user_by_email(email).await
    }

    async fn sync_status(&self, user_id: Uuid) -> Result<UserStatus, AppError> {
        tokio::task::yield_now().await;
        self.0.sync_status(user_id).await
    }
}

#[async_trait]
impl RoleCatalog for Interleaved {
    async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        tokio::task::yield_now().await;
        self.0.list_roles().await
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        tokio::task::yield_now().await;
        self.0.find_role_by_name(name).await
    }

    async fn find_role(&self, role_id: i32) -> Result<Option<Role>, AppError> {
        tokio::task::yield_now().await;
        self.0.find_role(role_id).await
    }
}

#[async_trait]
impl OrgUnitDirectory for Interleaved {
    async fn get_coordination(&self, id: Uuid) -> Result<Option<Coordination>, AppError> {
        tokio::task::yield_now().await;
        self.0.get_coordination(id).await
    }

    async fn get_supervision(&self, id: Uuid) -> Result<Option<Supervision>, AppError> {
        tokio::task::yield_now().await;
        self.0.get_supervision(id).await
    }
}
