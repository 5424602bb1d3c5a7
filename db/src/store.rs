use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::Res;
use sqlx::PgPool;

use crate::{
    dtos::subscription::{SubscriptionPatch, SubscriptionUpsert},
    models::subscription::{Provider, Subscription},
    subscription, usage, webhook_event,
};

/// Persistence used by the billing routes and webhook reconciliation.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// Atomically records a webhook event id. `true` means the caller owns it.
    async fn claim_webhook_event(
        &self,
        provider: Provider,
        event_id: &str,
        event_type: &str,
    ) -> Res<bool>;

    async fn get_subscription_by_user(&self, user_id: &str) -> Res<Option<Subscription>>;

    async fn get_subscription_by_provider_id(
        &self,
        provider: Provider,
        subscription_id: &str,
    ) -> Res<Option<Subscription>>;

    async fn upsert_subscription(&self, data: SubscriptionUpsert) -> Res<Subscription>;

    async fn update_subscription_by_provider_id(
        &self,
        provider: Provider,
        subscription_id: &str,
        patch: SubscriptionPatch,
    ) -> Res<Option<Subscription>>;
}

/// Persistence used by the dashboard tools.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn record_usage(&self, user_id: &str, tool_name: &str) -> Res<()>;

    async fn usage_counts(&self, user_id: &str) -> Res<HashMap<String, i64>>;

    async fn first_usage_at(&self, user_id: &str) -> Res<Option<DateTime<Utc>>>;

    async fn set_task_completed(&self, user_id: &str, day: i32, completed: bool) -> Res<()>;

    async fn completed_task_days(&self, user_id: &str) -> Res<Vec<i32>>;
}

/// Postgres-backed implementation of both stores.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl BillingStore for PgStore {
    async fn claim_webhook_event(
        &self,
        provider: Provider,
        event_id: &str,
        event_type: &str,
    ) -> Res<bool> {
        webhook_event::claim_event(&*self.pool, provider, event_id, event_type).await
    }

    async fn get_subscription_by_user(&self, user_id: &str) -> Res<Option<Subscription>> {
        subscription::get_subscription_by_user(&*self.pool, user_id).await
    }

    async fn get_subscription_by_provider_id(
        &self,
        provider: Provider,
        subscription_id: &str,
    ) -> Res<Option<Subscription>> {
        subscription::get_subscription_by_provider_id(&*self.pool, provider, subscription_id).await
    }

    async fn upsert_subscription(&self, data: SubscriptionUpsert) -> Res<Subscription> {
        subscription::upsert_subscription(&*self.pool, data).await
    }

    async fn update_subscription_by_provider_id(
        &self,
        provider: Provider,
        subscription_id: &str,
        patch: SubscriptionPatch,
    ) -> Res<Option<Subscription>> {
        subscription::update_subscription_by_provider_id(
            &*self.pool,
            provider,
            subscription_id,
            patch,
        )
        .await
    }
}

#[async_trait]
impl UsageStore for PgStore {
    async fn record_usage(&self, user_id: &str, tool_name: &str) -> Res<()> {
        usage::insert_usage(&*self.pool, user_id, tool_name).await
    }

    async fn usage_counts(&self, user_id: &str) -> Res<HashMap<String, i64>> {
        let counts = usage::get_usage_counts(&*self.pool, user_id).await?;
        Ok(counts.into_iter().collect())
    }

    async fn first_usage_at(&self, user_id: &str) -> Res<Option<DateTime<Utc>>> {
        usage::get_first_usage_at(&*self.pool, user_id).await
    }

    async fn set_task_completed(&self, user_id: &str, day: i32, completed: bool) -> Res<()> {
        usage::upsert_task_progress(&*self.pool, user_id, day, completed).await
    }

    async fn completed_task_days(&self, user_id: &str) -> Res<Vec<i32>> {
        usage::get_completed_days(&*self.pool, user_id).await
    }
}
