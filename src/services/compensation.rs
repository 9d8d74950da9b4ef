// src/services/compensation.rs

use crate::common::error::AppError;
use crate::db::ports::GrantStore;
use crate::models::rbac::GrantKey;

// Ação que desfaz uma escrita já feita na tabela de concessões
#[derive(Debug, Clone, Copy)]
pub enum Undo {
    // A concessão foi criada: desfazer = remover
    Delete(GrantKey),
    // A concessão foi removida: desfazer = recriar (com novo id)
    Restore(GrantKey),
}

/// Registro das escritas de um fluxo com vários passos.
///
/// As portas não compartilham transação, então quando um passo posterior
/// falha os anteriores são desfeitos na ordem inversa.
pub struct Compensation<'a> {
    grants: &'a dyn GrantStore,
    undo: Vec<Undo>,
}

impl<'a> Compensation<'a> {
    pub fn new(grants: &'a dyn GrantStore) -> Self {
        Self {
            grants,
            undo: Vec::new(),
        }
    }

    pub fn record(&mut self, undo: Undo) {
        self.undo.push(undo);
    }

    /// Desfaz tudo e devolve o erro que causou a reversão. Se alguma reversão
    /// falhar, o estado ficou inconsistente e o erro vira `StatusSyncFailed`.
    pub async fn rollback(self, cause: AppError) -> AppError {
        let mut failures = Vec::new();

        for undo in self.undo.into_iter().rev() {
            let result = match undo {
                Undo::Delete(key) => self.grants.delete_grant(key).await.map(|_| ()),
                Undo::Restore(key) => match self.grants.create_grant(key).await {
                    // Alguém recriou antes de nós: o estado desejado já está lá
                    Ok(_) | Err(AppError::DuplicateGrant) => Ok(()),
                    Err(e) => Err(e),
                },
            };

            if let Err(e) = result {
                tracing::error!("🔥 Falha ao compensar {:?}: {}", undo, e);
                failures.push(format!("{:?}: {}", undo, e));
            }
        }

        if failures.is_empty() {
            tracing::warn!("↩️ Operação revertida: {}", cause);
            cause
        } else {
            AppError::StatusSyncFailed(format!(
                "{}; compensação incompleta: {}",
                cause,
                failures.join(", ")
            ))
        }
    }
}
