use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{
    dtos::subscription::{SubscriptionPatch, SubscriptionUpsert},
    models::subscription::{Provider, Subscription},
};

/// Column names holding (customer, subscription, transaction, price) ids for a provider.
fn provider_columns(provider: Provider) -> [&'static str; 4] {
    match provider {
        Provider::Paddle => [
            "paddle_customer_id",
            "paddle_subscription_id",
            "paddle_transaction_id",
            "paddle_price_id",
        ],
        Provider::Stripe => [
            "stripe_customer_id",
            "stripe_subscription_id",
            "stripe_checkout_session_id",
            "stripe_price_id",
        ],
    }
}

pub async fn get_subscription_by_user<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: &str,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_subscription_by_provider_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    provider: Provider,
    subscription_id: &str,
) -> Res<Option<Subscription>> {
    let [_, subscription_col, _, _] = provider_columns(provider);
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT * FROM subscriptions WHERE {} = $1",
        subscription_col
    ))
    .bind(subscription_id)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

fn other_provider(provider: Provider) -> Provider {
    match provider {
        Provider::Paddle => Provider::Stripe,
        Provider::Stripe => Provider::Paddle,
    }
}

/// Inserts or replaces the user's row. At most one row exists per user.
///
/// The other provider's id columns are cleared so that its late events no
/// longer match the row.
pub async fn upsert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionUpsert,
) -> Res<Subscription> {
    let [customer_col, subscription_col, transaction_col, price_col] =
        provider_columns(data.provider);
    let [stale_customer_col, stale_subscription_col, stale_transaction_col, stale_price_col] =
        provider_columns(other_provider(data.provider));

    let query = format!(
        r#"
        INSERT INTO subscriptions (
            user_id, provider, plan_type, status, {customer_col}, {subscription_col}, {transaction_col},
            {price_col}, price_amount, current_period_start, current_period_end,
            cancel_at_period_end, metadata
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (user_id) DO UPDATE SET
            provider = EXCLUDED.provider,
            plan_type = EXCLUDED.plan_type,
            status = EXCLUDED.status,
            {customer_col} = EXCLUDED.{customer_col},
            {subscription_col} = EXCLUDED.{subscription_col},
            {transaction_col} = EXCLUDED.{transaction_col},
            {price_col} = EXCLUDED.{price_col},
            {stale_customer_col} = NULL,
            {stale_subscription_col} = NULL,
            {stale_transaction_col} = NULL,
            {stale_price_col} = NULL,
            price_amount = EXCLUDED.price_amount,
            current_period_start = EXCLUDED.current_period_start,
            current_period_end = EXCLUDED.current_period_end,
            cancel_at_period_end = EXCLUDED.cancel_at_period_end,
            metadata = EXCLUDED.metadata,
            updated_at = NOW()
        RETURNING *
        "#
    );

    sqlx::query_as::<_, Subscription>(&query)
        .bind(&data.user_id)
        .bind(data.provider.as_str())
        .bind(data.plan_type.as_str())
        .bind(data.status.as_str())
        .bind(&data.customer_id)
        .bind(&data.subscription_id)
        .bind(&data.transaction_id)
        .bind(&data.price_id)
        .bind(data.price_amount)
        .bind(data.current_period_start)
        .bind(data.current_period_end)
        .bind(data.cancel_at_period_end)
        .bind(&data.metadata)
        .fetch_one(executor)
        .await
        .map_err(AppError::from)
}

/// Applies a patch to the row holding the provider subscription id.
/// Returns `None` when no such row exists.
pub async fn update_subscription_by_provider_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    provider: Provider,
    subscription_id: &str,
    patch: SubscriptionPatch,
) -> Res<Option<Subscription>> {
    let [_, subscription_col, _, _] = provider_columns(provider);

    let query = format!(
        r#"
        UPDATE subscriptions SET
            status = COALESCE($2, status),
            current_period_start = COALESCE($3, current_period_start),
            current_period_end = COALESCE($4, current_period_end),
            cancel_at_period_end = COALESCE($5, cancel_at_period_end),
            updated_at = NOW()
        WHERE {subscription_col} = $1
        RETURNING *
        "#
    );

    sqlx::query_as::<_, Subscription>(&query)
        .bind(subscription_id)
        .bind(patch.status.map(|status| status.as_str()))
        .bind(patch.current_period_start)
        .bind(patch.current_period_end)
        .bind(patch.cancel_at_period_end)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}
