use std::future::Future;
use std::time::Duration;

use crate::common::error::AppError;

// ---
// Helper de timeout: toda ida ao banco tem um limite
// ---
/// Executa uma operação do banco com tempo limite. Estourar o limite vira
/// `AppError::PersistenceTimeout`; erros do sqlx viram `AppError::DatabaseError`.
pub(crate) async fn with_timeout<T, F>(limit: Duration, operation: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => Ok(result?),
        Err(_) => {
            tracing::warn!("⏱️ Operação no banco excedeu {:?}", limit);
            Err(AppError::PersistenceTimeout)
        }
    }
}
