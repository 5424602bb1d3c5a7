use chrono::Utc;
use common::error::{AppError, Res};
use db::{
    BillingStore,
    dtos::subscription::{SubscriptionPatch, SubscriptionUpsert},
    models::subscription::{Provider, SubscriptionStatus},
};
use serde_json::json;
use stripe::{Event, Webhook};

use crate::{
    models::stripe::{StripeCheckout, StripeEvent},
    services::webhook::{WebhookOutcome, apply_patch},
};

/// Creates an event for the webhook based on the request payload and signature.
/// Requires a webhook secret key.
pub fn construct_event(payload: &str, signature: &str, webhook_secret: &str) -> Res<Event> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(event) => Ok(event),
        Err(e) => {
            log::error!("Error constructing webhook event: {}", e);
            Err(AppError::BadRequest(format!("Webhook Error: {}", e)))
        }
    }
}

/// Applies one verified Stripe event to the subscriptions table.
pub async fn reconcile(store: &dyn BillingStore, event: StripeEvent) -> Res<WebhookOutcome> {
    match event {
        StripeEvent::CheckoutCompleted(checkout) => handle_checkout_completed(store, checkout).await,
        StripeEvent::SubscriptionUpdated(state) => {
            let patch = SubscriptionPatch {
                status: state.status,
                current_period_start: state.current_period_start,
                current_period_end: state.current_period_end,
                cancel_at_period_end: Some(state.cancel_at_period_end),
            };
            apply_patch(store, Provider::Stripe, &state.id, patch).await
        }
        StripeEvent::SubscriptionDeleted(state) => {
            apply_patch(
                store,
                Provider::Stripe,
                &state.id,
                SubscriptionPatch::status(SubscriptionStatus::Canceled),
            )
            .await
        }
        StripeEvent::Unhandled(event_type) => {
            log::info!("Unhandled event type: {}", event_type);
            Ok(WebhookOutcome::Unhandled(event_type))
        }
    }
}

async fn handle_checkout_completed(
    store: &dyn BillingStore,
    checkout: StripeCheckout,
) -> Res<WebhookOutcome> {
    let Some(user_id) = checkout.user_id.clone() else {
        log::error!("Checkout session {} has no user reference", checkout.session_id);
        return Ok(WebhookOutcome::Skipped("missing userId".to_string()));
    };

    let row = store
        .upsert_subscription(SubscriptionUpsert {
            user_id,
            provider: Provider::Stripe,
            plan_type: checkout.plan_type,
            status: SubscriptionStatus::Active,
            customer_id: checkout.customer_id,
            subscription_id: checkout.subscription_id,
            transaction_id: Some(checkout.session_id.clone()),
            price_id: None,
            price_amount: checkout.amount_total,
            current_period_start: Some(Utc::now()),
            current_period_end: None,
            cancel_at_period_end: false,
            metadata: json!({ "checkout_session": checkout.session_id }),
        })
        .await?;

    log::info!("Checkout session completed: {} for user {}", checkout.session_id, row.user_id);
    Ok(WebhookOutcome::Processed)
}
