use chrono::{DateTime, Utc};
use db::models::subscription::{PlanType, SubscriptionStatus};
use stripe::{CheckoutSession, CheckoutSessionMode, Event, EventObject, EventType, Subscription};

/// Stripe notifications narrowed to the ones that change billing state.
#[derive(Debug, Clone)]
pub enum StripeEvent {
    CheckoutCompleted(StripeCheckout),
    SubscriptionUpdated(StripeSubscriptionState),
    SubscriptionDeleted(StripeSubscriptionState),
    Unhandled(String),
}

#[derive(Debug, Clone)]
pub struct StripeCheckout {
    pub session_id: String,
    pub user_id: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub plan_type: PlanType,
    pub amount_total: i64,
}

#[derive(Debug, Clone)]
pub struct StripeSubscriptionState {
    pub id: String,
    pub status: Option<SubscriptionStatus>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

impl From<Event> for StripeEvent {
    fn from(event: Event) -> Self {
        let event_type = event.type_.to_string();
        match (event.type_, event.data.object) {
            (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
                StripeEvent::CheckoutCompleted(StripeCheckout::from(session))
            }
            (EventType::CustomerSubscriptionUpdated, EventObject::Subscription(subscription)) => {
                StripeEvent::SubscriptionUpdated(StripeSubscriptionState::from(subscription))
            }
            (EventType::CustomerSubscriptionDeleted, EventObject::Subscription(subscription)) => {
                StripeEvent::SubscriptionDeleted(StripeSubscriptionState::from(subscription))
            }
            _ => StripeEvent::Unhandled(event_type),
        }
    }
}

impl From<CheckoutSession> for StripeCheckout {
    fn from(session: CheckoutSession) -> Self {
        // checkout is created with client_reference_id; metadata is the fallback
        let user_id = session
            .client_reference_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| {
                session
                    .metadata
                    .as_ref()
                    .and_then(|metadata| metadata.get("userId").cloned())
            });

        let plan_type = if matches!(session.mode, CheckoutSessionMode::Payment) {
            PlanType::OneTime
        } else {
            PlanType::Monthly
        };

        StripeCheckout {
            session_id: session.id.to_string(),
            user_id,
            customer_id: session.customer.as_ref().map(|customer| customer.id().to_string()),
            subscription_id: session
                .subscription
                .as_ref()
                .map(|subscription| subscription.id().to_string()),
            plan_type,
            amount_total: session.amount_total.unwrap_or(0),
        }
    }
}

impl From<Subscription> for StripeSubscriptionState {
    fn from(subscription: Subscription) -> Self {
        StripeSubscriptionState {
            id: subscription.id.to_string(),
            status: subscription.status.as_str().parse().ok(),
            current_period_start: DateTime::from_timestamp(subscription.current_period_start, 0),
            current_period_end: DateTime::from_timestamp(subscription.current_period_end, 0),
            cancel_at_period_end: subscription.cancel_at_period_end,
        }
    }
}
