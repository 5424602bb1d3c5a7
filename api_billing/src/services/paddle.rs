use chrono::Utc;
use common::{env_config::Config, error::Res};
use db::{
    BillingStore,
    dtos::subscription::{SubscriptionPatch, SubscriptionUpsert},
    models::subscription::{PlanType, Provider, SubscriptionStatus},
};
use serde_json::json;

use crate::{
    models::paddle::{PaddleEvent, PaddleSubscription, PaddleTransaction},
    services::webhook::{WebhookOutcome, apply_patch},
};

/// Applies one verified Paddle event to the subscriptions table.
pub async fn reconcile(
    store: &dyn BillingStore,
    config: &Config,
    event: PaddleEvent,
) -> Res<WebhookOutcome> {
    match event {
        PaddleEvent::TransactionCompleted(transaction) => {
            handle_transaction_completed(store, config, transaction).await
        }
        PaddleEvent::SubscriptionCreated(subscription) => {
            upsert_recurring(store, subscription).await
        }
        PaddleEvent::SubscriptionUpdated(subscription) => {
            handle_subscription_updated(store, subscription).await
        }
        PaddleEvent::SubscriptionCanceled(subscription) => {
            apply_patch(
                store,
                Provider::Paddle,
                &subscription.id,
                SubscriptionPatch::status(SubscriptionStatus::Canceled),
            )
            .await
        }
        PaddleEvent::SubscriptionPaused(subscription) => {
            apply_patch(
                store,
                Provider::Paddle,
                &subscription.id,
                SubscriptionPatch::status(SubscriptionStatus::Paused),
            )
            .await
        }
        PaddleEvent::SubscriptionResumed(subscription) => {
            apply_patch(
                store,
                Provider::Paddle,
                &subscription.id,
                SubscriptionPatch::status(SubscriptionStatus::Active),
            )
            .await
        }
        PaddleEvent::Unhandled(event_type) => {
            log::info!("Unhandled Paddle event type: {}", event_type);
            Ok(WebhookOutcome::Unhandled(event_type))
        }
    }
}

/// One-time purchases. Recurring charges are owned by the subscription events.
async fn handle_transaction_completed(
    store: &dyn BillingStore,
    config: &Config,
    transaction: PaddleTransaction,
) -> Res<WebhookOutcome> {
    let Some(user_id) = transaction.user_id() else {
        log::error!("No userId in transaction {} custom_data", transaction.id);
        return Ok(WebhookOutcome::Skipped("missing userId".to_string()));
    };

    let price_id = transaction.price_id();
    let monthly_price = config.paddle_price_id_monthly.as_str();
    let is_monthly_price = !monthly_price.is_empty() && price_id == Some(monthly_price);
    if is_monthly_price || transaction.subscription_id.is_some() {
        log::info!(
            "Transaction {} belongs to a subscription, waiting for subscription events",
            transaction.id
        );
        return Ok(WebhookOutcome::Skipped("recurring transaction".to_string()));
    }

    let row = store
        .upsert_subscription(SubscriptionUpsert {
            user_id: user_id.to_string(),
            provider: Provider::Paddle,
            plan_type: PlanType::OneTime,
            status: SubscriptionStatus::Active,
            customer_id: transaction.customer_id.clone(),
            subscription_id: None,
            transaction_id: Some(transaction.id.clone()),
            price_id: price_id.map(str::to_string),
            price_amount: transaction.total(),
            current_period_start: Some(Utc::now()),
            current_period_end: None,
            cancel_at_period_end: false,
            metadata: json!({ "transaction_details": transaction.details }),
        })
        .await?;

    log::info!("One-time purchase recorded for user {}", row.user_id);
    Ok(WebhookOutcome::Processed)
}

async fn upsert_recurring(
    store: &dyn BillingStore,
    subscription: PaddleSubscription,
) -> Res<WebhookOutcome> {
    let Some(user_id) = subscription.user_id() else {
        log::error!("No userId in subscription {} custom_data", subscription.id);
        return Ok(WebhookOutcome::Skipped("missing userId".to_string()));
    };

    let (current_period_start, current_period_end) = subscription.period();
    let row = store
        .upsert_subscription(SubscriptionUpsert {
            user_id: user_id.to_string(),
            provider: Provider::Paddle,
            plan_type: PlanType::Monthly,
            status: subscription.status,
            customer_id: subscription.customer_id.clone(),
            subscription_id: Some(subscription.id.clone()),
            transaction_id: None,
            price_id: subscription.price_id().map(str::to_string),
            price_amount: subscription.unit_amount(),
            current_period_start,
            current_period_end,
            cancel_at_period_end: subscription.cancel_at_period_end(),
            metadata: json!({
                "billing_cycle": subscription.billing_cycle,
                "collection_mode": subscription.collection_mode,
            }),
        })
        .await?;

    log::info!(
        "Subscription {} recorded for user {} ({})",
        subscription.id,
        row.user_id,
        row.status
    );
    Ok(WebhookOutcome::Processed)
}

async fn handle_subscription_updated(
    store: &dyn BillingStore,
    subscription: PaddleSubscription,
) -> Res<WebhookOutcome> {
    let known = store
        .get_subscription_by_provider_id(Provider::Paddle, &subscription.id)
        .await?
        .is_some();

    // updated can overtake created; custom_data is enough to create the row
    if !known && subscription.user_id().is_some() {
        return upsert_recurring(store, subscription).await;
    }

    let (current_period_start, current_period_end) = subscription.period();
    let patch = SubscriptionPatch {
        status: Some(subscription.status),
        current_period_start,
        current_period_end,
        cancel_at_period_end: Some(subscription.cancel_at_period_end()),
    };
    apply_patch(store, Provider::Paddle, &subscription.id, patch).await
}
