use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::subscription::Provider;

/// Records an event id in the ledger in one statement.
/// Returns `true` when this call inserted it, `false` when it was already there.
pub async fn claim_event<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    provider: Provider,
    event_id: &str,
    event_type: &str,
) -> Res<bool> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO webhook_events (provider, event_id, event_type)
        VALUES ($1, $2, $3)
        ON CONFLICT (provider, event_id) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(provider.as_str())
    .bind(event_id)
    .bind(event_type)
    .fetch_optional(executor)
    .await
    .map(|claimed| claimed.is_some())
    .map_err(AppError::from)
}
