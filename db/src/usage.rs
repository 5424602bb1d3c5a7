use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

pub async fn insert_usage<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
    tool_name: &str,
) -> Res<()> {
    sqlx::query("INSERT INTO usage_tracking (user_id, tool_name) VALUES ($1, $2)")
        .bind(user_id)
        .bind(tool_name)
        .execute(executor)
        .await
        .map_err(AppError::from)?;
    Ok(())
}

/// Invocation count per tool name for one user.
pub async fn get_usage_counts<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
) -> Res<Vec<(String, i64)>> {
    sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT tool_name, COUNT(*) AS uses
        FROM usage_tracking
        WHERE user_id = $1
        GROUP BY tool_name
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn get_first_usage_at<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
) -> Res<Option<DateTime<Utc>>> {
    sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
        "SELECT MIN(accessed_at) FROM usage_tracking WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

pub async fn upsert_task_progress<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
    day: i32,
    completed: bool,
) -> Res<()> {
    sqlx::query(
        r#"
        INSERT INTO launch_task_progress (user_id, day, is_completed)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, day) DO UPDATE SET
            is_completed = EXCLUDED.is_completed,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(day)
    .bind(completed)
    .execute(executor)
    .await
    .map_err(AppError::from)?;
    Ok(())
}

pub async fn get_completed_days<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
) -> Res<Vec<i32>> {
    sqlx::query_scalar::<_, i32>(
        "SELECT day FROM launch_task_progress WHERE user_id = $1 AND is_completed ORDER BY day",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}
