use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use crate::error::ApiError;

/// Run `work` inside one transaction on one pooled connection.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`. A transaction
/// dropped on any other path (panic, cancelled request) is rolled back by sqlx, and the
/// connection goes back to the pool in every case.
///
/// ```ignore
/// let issues = transactional(&pool, |conn| {
///     Box::pin(async move {
///         let rows: Vec<Issue> = stmt.query_as().fetch_all(&mut *conn).await?;
///         Ok::<_, ApiError>(rows)
///     })
/// })
/// .await?;
/// ```
pub async fn transactional<T, F>(pool: &PgPool, work: F) -> Result<T, ApiError>
where
    F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, ApiError>>,
{
    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!("Failed to open transaction: {}", e);
        ApiError::from(e)
    })?;

    match work(&mut *tx).await {
        Ok(value) => {
            tx.commit().await.map_err(|e| {
                tracing::error!("Failed to commit transaction: {}", e);
                ApiError::from(e)
            })?;
            Ok(value)
        }
        Err(err) => {
            tracing::error!("Request failed, rolling back: {}", err);
            if let Err(e) = tx.rollback().await {
                tracing::error!("Rollback failed: {}", e);
            }
            Err(err)
        }
    }
}
