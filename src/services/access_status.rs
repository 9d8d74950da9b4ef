// src/services/access_status.rs

use crate::models::auth::{User, UserStatus};
use crate::models::rbac::Grant;

/// Status que deve ser exibido para o usuário.
///
/// Qualquer concessão (geral ou contextual) torna o usuário `ativo`; sem
/// concessões vale o status gravado. É a única regra de exibição: tanto a
/// tela de um usuário quanto a listagem filtrada passam por aqui.
pub fn resolve_status(user: &User, grants: &[Grant]) -> UserStatus {
    if grants.is_empty() {
        user.status
    } else {
        UserStatus::Ativo
    }
}
