use chrono::{DateTime, NaiveDate, Utc};
use common::error::{AppError, Res};
use db::models::subscription::SubscriptionStatus;
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

/// Outer shape shared by every Paddle notification.
#[derive(Debug, Clone, Deserialize)]
pub struct PaddleEnvelope {
    pub event_id: String,
    pub event_type: String,
    #[serde(default)]
    pub occurred_at: Option<String>,
    #[serde(default)]
    pub data: Value,
}

/// The event types this service acts on. Anything else is acknowledged and ignored.
#[derive(Debug, Clone)]
pub enum PaddleEvent {
    TransactionCompleted(PaddleTransaction),
    SubscriptionCreated(PaddleSubscription),
    SubscriptionUpdated(PaddleSubscription),
    SubscriptionCanceled(PaddleSubscriptionRef),
    SubscriptionPaused(PaddleSubscriptionRef),
    SubscriptionResumed(PaddleSubscriptionRef),
    Unhandled(String),
}

impl PaddleEvent {
    /// Validates `data` against the schema of the envelope's event type.
    pub fn parse(envelope: PaddleEnvelope) -> Res<Self> {
        let PaddleEnvelope {
            event_type, data, ..
        } = envelope;

        let event = match event_type.as_str() {
            "transaction.completed" => {
                PaddleEvent::TransactionCompleted(payload(&event_type, data)?)
            }
            "subscription.created" => PaddleEvent::SubscriptionCreated(payload(&event_type, data)?),
            "subscription.updated" => PaddleEvent::SubscriptionUpdated(payload(&event_type, data)?),
            "subscription.canceled" => {
                PaddleEvent::SubscriptionCanceled(payload(&event_type, data)?)
            }
            "subscription.paused" => PaddleEvent::SubscriptionPaused(payload(&event_type, data)?),
            "subscription.resumed" => PaddleEvent::SubscriptionResumed(payload(&event_type, data)?),
            _ => PaddleEvent::Unhandled(event_type.clone()),
        };
        Ok(event)
    }
}

fn payload<T: for<'de> Deserialize<'de>>(event_type: &str, data: Value) -> Res<T> {
    serde_json::from_value(data)
        .map_err(|e| AppError::BadRequest(format!("Malformed {} payload: {}", event_type, e)))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomData {
    #[serde(rename = "userId", alias = "user_id", default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaddleMoney {
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaddlePrice {
    pub id: String,
    #[serde(default)]
    pub unit_price: Option<PaddleMoney>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaddleItem {
    #[serde(default)]
    pub price: Option<PaddlePrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingPeriod {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub starts_at: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub ends_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledChange {
    pub action: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaddleTransaction {
    pub id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Set when the transaction bills a recurring subscription.
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub custom_data: Option<CustomData>,
    #[serde(default)]
    pub items: Vec<PaddleItem>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaddleSubscription {
    pub id: String,
    #[serde(deserialize_with = "deserialize_status")]
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub custom_data: Option<CustomData>,
    #[serde(default)]
    pub items: Vec<PaddleItem>,
    #[serde(default)]
    pub current_billing_period: Option<BillingPeriod>,
    #[serde(default)]
    pub scheduled_change: Option<ScheduledChange>,
    #[serde(default)]
    pub billing_cycle: Option<Value>,
    #[serde(default)]
    pub collection_mode: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaddleSubscriptionRef {
    pub id: String,
}

fn user_id_of(custom_data: &Option<CustomData>) -> Option<&str> {
    custom_data
        .as_ref()
        .and_then(|data| data.user_id.as_deref())
        .filter(|id| !id.is_empty())
}

fn first_price(items: &[PaddleItem]) -> Option<&PaddlePrice> {
    items.first().and_then(|item| item.price.as_ref())
}

impl PaddleTransaction {
    pub fn user_id(&self) -> Option<&str> {
        user_id_of(&self.custom_data)
    }

    pub fn price_id(&self) -> Option<&str> {
        first_price(&self.items).map(|price| price.id.as_str())
    }

    /// `details.totals.total`, in minor units.
    pub fn total(&self) -> i64 {
        self.details
            .as_ref()
            .and_then(|details| details.pointer("/totals/total"))
            .and_then(amount_from_value)
            .unwrap_or(0)
    }
}

impl PaddleSubscription {
    pub fn user_id(&self) -> Option<&str> {
        user_id_of(&self.custom_data)
    }

    pub fn price_id(&self) -> Option<&str> {
        first_price(&self.items).map(|price| price.id.as_str())
    }

    /// Unit price of the first item, in minor units.
    pub fn unit_amount(&self) -> i64 {
        first_price(&self.items)
            .and_then(|price| price.unit_price.as_ref())
            .map(|money| money.amount)
            .unwrap_or(0)
    }

    pub fn cancel_at_period_end(&self) -> bool {
        self.scheduled_change
            .as_ref()
            .is_some_and(|change| change.action == "cancel")
    }

    pub fn period(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match &self.current_billing_period {
            Some(period) => (Some(period.starts_at), Some(period.ends_at)),
            None => (None, None),
        }
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(d)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {}", raw)))
}

fn deserialize_status<'de, D: Deserializer<'de>>(d: D) -> Result<SubscriptionStatus, D::Error> {
    let raw = String::deserialize(d)?;
    raw.parse().map_err(de::Error::custom)
}

// Paddle sends money as decimal strings; older payloads used numbers.
fn amount_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::String(text) => text.trim().parse().ok(),
        Value::Number(number) => number.as_i64(),
        _ => None,
    }
}

fn deserialize_amount<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    amount_from_value(&value)
        .ok_or_else(|| de::Error::custom(format!("invalid amount: {}", value)))
}
