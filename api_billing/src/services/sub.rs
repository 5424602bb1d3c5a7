use common::error::{AppError, Res};
use db::{
    BillingStore,
    models::subscription::{PlanType, Subscription},
};

use crate::{dtos::billing::CancelResponse, services::provider::BillingProvider};

pub const CANCEL_SCHEDULED_MESSAGE: &str = "Subscription will cancel at end of billing period";

/// Gets the caller's subscription row.
pub async fn get_user_subscription(store: &dyn BillingStore, user_id: &str) -> Res<Subscription> {
    store
        .get_subscription_by_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription found".to_string()))
}

/// Schedules cancellation of the caller's recurring subscription at period end.
///
/// The row itself is not touched here; the provider's follow-up webhook
/// carries the new state.
pub async fn cancel_subscription(
    store: &dyn BillingStore,
    provider: &dyn BillingProvider,
    user_id: &str,
) -> Res<CancelResponse> {
    let subscription = get_user_subscription(store, user_id).await?;

    if subscription.plan() != Some(PlanType::Monthly) {
        return Err(AppError::BadRequest(
            "One-time purchases cannot be canceled".to_string(),
        ));
    }

    let (which, subscription_id) = subscription
        .provider_subscription()
        .ok_or_else(|| AppError::BadRequest("No provider subscription ID found".to_string()))?;

    log::info!(
        "Canceling {} subscription {} for user {}",
        which,
        subscription_id,
        user_id
    );
    let data = provider.cancel_at_period_end(which, subscription_id).await?;

    Ok(CancelResponse {
        success: true,
        message: CANCEL_SCHEDULED_MESSAGE.to_string(),
        data,
    })
}
