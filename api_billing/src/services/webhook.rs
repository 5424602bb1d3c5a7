use std::future::Future;

use common::error::Res;
use db::{
    BillingStore,
    dtos::subscription::SubscriptionPatch,
    models::subscription::Provider,
};

/// What happened to a verified delivery. Every outcome is acknowledged with 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Processed,
    Duplicate,
    Unhandled(String),
    Skipped(String),
    Failed(String),
}

/// Runs `handler` at most once per `(provider, event_id)`.
///
/// The claim is a single atomic insert into the ledger. When the ledger
/// itself is unreachable the event is still processed.
pub async fn process_once<F>(
    store: &dyn BillingStore,
    provider: Provider,
    event_id: &str,
    event_type: &str,
    handler: F,
) -> WebhookOutcome
where
    F: Future<Output = Res<WebhookOutcome>>,
{
    match store.claim_webhook_event(provider, event_id, event_type).await {
        Ok(true) => {}
        Ok(false) => {
            log::info!("Duplicate {} webhook event detected, skipping: {}", provider, event_id);
            return WebhookOutcome::Duplicate;
        }
        Err(e) => {
            log::error!("Failed to record {} webhook event {}: {}", provider, event_id, e);
        }
    }

    match handler.await {
        Ok(outcome) => {
            log::info!("{} webhook {} ({}): {:?}", provider, event_id, event_type, outcome);
            outcome
        }
        Err(e) => {
            log::error!("Error processing {} webhook {}: {}", provider, event_id, e);
            WebhookOutcome::Failed(e.to_string())
        }
    }
}

/// Patches the row holding `subscription_id`. A row already `canceled` keeps
/// that status.
pub async fn apply_patch(
    store: &dyn BillingStore,
    provider: Provider,
    subscription_id: &str,
    patch: SubscriptionPatch,
) -> Res<WebhookOutcome> {
    let Some(existing) = store
        .get_subscription_by_provider_id(provider, subscription_id)
        .await?
    else {
        log::error!("Subscription not found: {}", subscription_id);
        return Ok(WebhookOutcome::Skipped(format!(
            "subscription {} not found",
            subscription_id
        )));
    };

    if let (Some(current), Some(next)) = (existing.current_status(), patch.status) {
        if !current.can_transition_to(next) {
            log::warn!(
                "Ignoring {} -> {} for subscription {}",
                current,
                next,
                subscription_id
            );
            return Ok(WebhookOutcome::Skipped(format!(
                "subscription {} is {}",
                subscription_id, current
            )));
        }
    }

    store
        .update_subscription_by_provider_id(provider, subscription_id, patch)
        .await?;
    log::info!("Subscription {} updated", subscription_id);
    Ok(WebhookOutcome::Processed)
}
