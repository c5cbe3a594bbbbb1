//! Activity log for inventory actions

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::error::AppResult;

/// Append an activity entry.
///
/// Generic over the executor so it can run inside a caller's transaction
/// (inbound approval) or directly on the pool (best-effort entries).
pub async fn record<'e, E>(executor: E, user_id: Uuid, activity: &str) -> AppResult<()>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("INSERT INTO activity_log (user_id, activity) VALUES ($1, $2)")
        .bind(user_id)
        .bind(activity)
        .execute(executor)
        .await?;
    Ok(())
}

/// Append an activity entry outside any transaction; failures are logged only
pub async fn record_best_effort(db: &PgPool, user_id: Uuid, activity: &str) {
    if let Err(e) = record(db, user_id, activity).await {
        tracing::warn!(%user_id, "Failed to write activity log entry: {}", e);
    }
}
