//! In-process store used by the HTTP tests of the api crates.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{AppError, Res};
use uuid::Uuid;

use crate::{
    dtos::subscription::{SubscriptionPatch, SubscriptionUpsert},
    models::subscription::{Provider, Subscription},
    store::{BillingStore, UsageStore},
};

#[derive(Default)]
struct State {
    subscriptions: HashMap<String, Subscription>,
    events: HashSet<(Provider, String)>,
    usage: Vec<(String, String, DateTime<Utc>)>,
    tasks: HashMap<(String, i32), bool>,
    mutations: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    ledger_down: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every ledger call fail, as if the events table were unreachable.
    pub fn with_ledger_down(self) -> Self {
        self.ledger_down.store(true, Ordering::SeqCst);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of subscription writes that touched a row.
    pub fn mutations(&self) -> usize {
        self.state().mutations
    }

    pub fn subscription(&self, user_id: &str) -> Option<Subscription> {
        self.state().subscriptions.get(user_id).cloned()
    }

    pub fn insert_subscription(&self, subscription: Subscription) {
        self.state()
            .subscriptions
            .insert(subscription.user_id.clone(), subscription);
    }

    /// Seeds a usage entry with an explicit timestamp.
    pub fn insert_usage_at(&self, user_id: &str, tool_name: &str, at: DateTime<Utc>) {
        self.state()
            .usage
            .push((user_id.to_string(), tool_name.to_string(), at));
    }
}

fn empty_row(user_id: &str) -> Subscription {
    let now = Utc::now();
    Subscription {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        provider: String::new(),
        plan_type: String::new(),
        status: String::new(),
        paddle_customer_id: None,
        paddle_subscription_id: None,
        paddle_transaction_id: None,
        paddle_price_id: None,
        stripe_customer_id: None,
        stripe_subscription_id: None,
        stripe_checkout_session_id: None,
        stripe_price_id: None,
        price_amount: 0,
        current_period_start: None,
        current_period_end: None,
        cancel_at_period_end: false,
        metadata: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn claim_webhook_event(
        &self,
        provider: Provider,
        event_id: &str,
        _event_type: &str,
    ) -> Res<bool> {
        if self.ledger_down.load(Ordering::SeqCst) {
            return Err(AppError::Internal("webhook_events unreachable".to_string()));
        }
        Ok(self.state().events.insert((provider, event_id.to_string())))
    }

    async fn get_subscription_by_user(&self, user_id: &str) -> Res<Option<Subscription>> {
        Ok(self.subscription(user_id))
    }

    async fn get_subscription_by_provider_id(
        &self,
        provider: Provider,
        subscription_id: &str,
    ) -> Res<Option<Subscription>> {
        Ok(self
            .state()
            .subscriptions
            .values()
            .find(|row| row.subscription_id_for(provider) == Some(subscription_id))
            .cloned())
    }

    async fn upsert_subscription(&self, data: SubscriptionUpsert) -> Res<Subscription> {
        let mut state = self.state();
        let mut row = state
            .subscriptions
            .remove(&data.user_id)
            .unwrap_or_else(|| empty_row(&data.user_id));

        row.provider = data.provider.as_str().to_string();
        row.plan_type = data.plan_type.as_str().to_string();
        row.status = data.status.as_str().to_string();
        // only the current provider's ids stay on the row
        let ids = [data.customer_id, data.subscription_id, data.transaction_id, data.price_id];
        let (paddle, stripe) = match data.provider {
            Provider::Paddle => (ids, Default::default()),
            Provider::Stripe => (Default::default(), ids),
        };
        [
            row.paddle_customer_id,
            row.paddle_subscription_id,
            row.paddle_transaction_id,
            row.paddle_price_id,
        ] = paddle;
        [
            row.stripe_customer_id,
            row.stripe_subscription_id,
            row.stripe_checkout_session_id,
            row.stripe_price_id,
        ] = stripe;
        row.price_amount = data.price_amount;
        row.current_period_start = data.current_period_start;
        row.current_period_end = data.current_period_end;
        row.cancel_at_period_end = data.cancel_at_period_end;
        row.metadata = data.metadata;
        row.updated_at = Utc::now();

        state.subscriptions.insert(data.user_id, row.clone());
        state.mutations += 1;
        Ok(row)
    }

    async fn update_subscription_by_provider_id(
        &self,
        provider: Provider,
        subscription_id: &str,
        patch: SubscriptionPatch,
    ) -> Res<Option<Subscription>> {
        let mut state = self.state();
        let Some(row) = state
            .subscriptions
            .values_mut()
            .find(|row| row.subscription_id_for(provider) == Some(subscription_id))
        else {
            return Ok(None);
        };

        if let Some(status) = patch.status {
            row.status = status.as_str().to_string();
        }
        if let Some(start) = patch.current_period_start {
            row.current_period_start = Some(start);
        }
        if let Some(end) = patch.current_period_end {
            row.current_period_end = Some(end);
        }
        if let Some(cancel) = patch.cancel_at_period_end {
            row.cancel_at_period_end = cancel;
        }
        row.updated_at = Utc::now();

        let updated = row.clone();
        state.mutations += 1;
        Ok(Some(updated))
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn record_usage(&self, user_id: &str, tool_name: &str) -> Res<()> {
        self.insert_usage_at(user_id, tool_name, Utc::now());
        Ok(())
    }

    async fn usage_counts(&self, user_id: &str) -> Res<HashMap<String, i64>> {
        let mut counts = HashMap::new();
        for (owner, tool, _) in self.state().usage.iter() {
            if owner == user_id {
                *counts.entry(tool.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn first_usage_at(&self, user_id: &str) -> Res<Option<DateTime<Utc>>> {
        Ok(self
            .state()
            .usage
            .iter()
            .filter(|(owner, _, _)| owner == user_id)
            .map(|(_, _, at)| *at)
            .min())
    }

    async fn set_task_completed(&self, user_id: &str, day: i32, completed: bool) -> Res<()> {
        self.state()
            .tasks
            .insert((user_id.to_string(), day), completed);
        Ok(())
    }

    async fn completed_task_days(&self, user_id: &str) -> Res<Vec<i32>> {
        let mut days: Vec<i32> = self
            .state()
            .tasks
            .iter()
            .filter(|((owner, _), done)| owner == user_id && **done)
            .map(|((_, day), _)| *day)
            .collect();
        days.sort_unstable();
        Ok(days)
    }
}
