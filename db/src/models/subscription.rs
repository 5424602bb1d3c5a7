use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::JsonValue;
use uuid::Uuid;

/// Payment provider a subscription row or webhook event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Paddle,
    Stripe,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Paddle => "paddle",
            Provider::Stripe => "stripe",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paddle" => Ok(Provider::Paddle),
            "stripe" => Ok(Provider::Stripe),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    #[serde(alias = "one-time")]
    OneTime,
    Monthly,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::OneTime => "one_time",
            PlanType::Monthly => "monthly",
        }
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_time" | "one-time" => Ok(PlanType::OneTime),
            "monthly" => Ok(PlanType::Monthly),
            other => Err(format!("Unknown plan type: {}", other)),
        }
    }
}

/// Billing status, shared by both providers.
///
/// `none -> active -> {past_due, paused} -> active | canceled`, and
/// `active -> canceled` directly. `canceled` is terminal for a given
/// provider subscription id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Paused,
    Canceled,
    Incomplete,
    IncompleteExpired,
    Unpaid,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
            SubscriptionStatus::IncompleteExpired => "incomplete_expired",
            SubscriptionStatus::Unpaid => "unpaid",
        }
    }

    /// Whether a row in this status may move to `next`.
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        *self != SubscriptionStatus::Canceled || next == SubscriptionStatus::Canceled
    }

    /// Statuses that unlock paid features.
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::Trialing)
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "paused" => Ok(SubscriptionStatus::Paused),
            // stripe spells it "canceled", older payloads "cancelled"
            "canceled" | "cancelled" => Ok(SubscriptionStatus::Canceled),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            "incomplete_expired" => Ok(SubscriptionStatus::IncompleteExpired),
            "unpaid" => Ok(SubscriptionStatus::Unpaid),
            other => Err(format!("Unknown subscription status: {}", other)),
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per user describing their current billing state.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: String,
    /// Provider of the latest purchase; only its id columns are populated.
    pub provider: String,
    pub plan_type: String,
    pub status: String,
    pub paddle_customer_id: Option<String>,
    pub paddle_subscription_id: Option<String>,
    pub paddle_transaction_id: Option<String>,
    pub paddle_price_id: Option<String>,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub stripe_checkout_session_id: Option<String>,
    pub stripe_price_id: Option<String>,
    pub price_amount: i64,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn plan(&self) -> Option<PlanType> {
        self.plan_type.parse().ok()
    }

    pub fn current_status(&self) -> Option<SubscriptionStatus> {
        self.status.parse().ok()
    }

    pub fn current_provider(&self) -> Option<Provider> {
        self.provider.parse().ok()
    }

    /// The recurring subscription of the row's current provider.
    pub fn provider_subscription(&self) -> Option<(Provider, &str)> {
        let provider = self.current_provider()?;
        non_empty(self.subscription_id_for(provider)).map(|id| (provider, id))
    }

    pub fn subscription_id_for(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::Paddle => self.paddle_subscription_id.as_deref(),
            Provider::Stripe => self.stripe_subscription_id.as_deref(),
        }
    }
}

fn non_empty(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.is_empty())
}
