use db::models::subscription::{PlanType, Subscription};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookAck {
    pub received: bool,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub subscription: Subscription,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default, alias = "priceId")]
    pub price_id: Option<String>,
    #[serde(alias = "planType")]
    pub plan_type: PlanType,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub url: String,
}
