use chrono::{DateTime, Utc};
use sqlx::types::JsonValue;

use crate::models::subscription::{PlanType, Provider, SubscriptionStatus};

/// Full description of a user's billing state, written keyed by `user_id`.
/// Provider-specific ids land in that provider's columns.
#[derive(Debug, Clone)]
pub struct SubscriptionUpsert {
    pub user_id: String,
    pub provider: Provider,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    /// Paddle transaction id or Stripe checkout session id.
    pub transaction_id: Option<String>,
    pub price_id: Option<String>,
    pub price_amount: i64,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub metadata: JsonValue,
}

/// Partial update applied to the row holding a provider subscription id.
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionPatch {
    pub status: Option<SubscriptionStatus>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: Option<bool>,
}

impl SubscriptionPatch {
    pub fn status(status: SubscriptionStatus) -> Self {
        SubscriptionPatch {
            status: Some(status),
            ..Default::default()
        }
    }
}
