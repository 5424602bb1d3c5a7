use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    env_config::PaddleEnvironment,
    error::{AppError, Res},
};

/// Thin client for the parts of the Paddle Billing REST API this service calls.
#[derive(Clone, Debug)]
pub struct PaddleClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TransactionEnvelope {
    data: TransactionData,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    id: String,
    checkout: Option<TransactionCheckout>,
}

#[derive(Debug, Deserialize)]
struct TransactionCheckout {
    url: Option<String>,
}

pub fn create_client(api_key: &str, environment: PaddleEnvironment) -> PaddleClient {
    PaddleClient::with_base_url(api_key, environment.api_base_url())
}

impl PaddleClient {
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        PaddleClient {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn ensure_configured(&self) -> Res<()> {
        if self.is_configured() {
            Ok(())
        } else {
            log::error!("PADDLE_API_KEY not configured");
            Err(AppError::Internal("Payment system not configured".to_string()))
        }
    }

    /// Schedules cancellation at the end of the current billing period.
    /// Returns Paddle's response body.
    pub async fn cancel_subscription(&self, subscription_id: &str) -> Res<Value> {
        self.ensure_configured()?;

        let response = self
            .http
            .post(format!(
                "{}/subscriptions/{}/cancel",
                self.base_url, subscription_id
            ))
            .bearer_auth(&self.api_key)
            .json(&json!({ "effective_from": "next_billing_period" }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Paddle cancellation failed: {}", error_text);
            return Err(AppError::Provider {
                status: status.as_u16(),
                message: "Failed to cancel subscription with Paddle".to_string(),
            });
        }

        log::info!("Subscription canceled successfully: {}", subscription_id);
        response.json::<Value>().await.map_err(AppError::from)
    }

    /// Creates a transaction for one price and returns the hosted checkout URL.
    /// The user id travels in `custom_data` so webhooks can find the account.
    pub async fn create_checkout(&self, price_id: &str, user_id: &str) -> Res<String> {
        self.ensure_configured()?;

        let response = self
            .http
            .post(format!("{}/transactions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "items": [{ "price_id": price_id, "quantity": 1 }],
                "custom_data": { "userId": user_id },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("Paddle transaction creation failed: {}", error_text);
            return Err(AppError::Provider {
                status: status.as_u16(),
                message: "Failed to create Paddle checkout".to_string(),
            });
        }

        let envelope = response.json::<TransactionEnvelope>().await?;
        envelope
            .data
            .checkout
            .and_then(|checkout| checkout.url)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Paddle transaction {} has no checkout url",
                    envelope.data.id
                ))
            })
    }
}
