use async_trait::async_trait;
use common::{
    env_config::Config,
    error::{AppError, Res},
    paddle::{self, PaddleClient},
    stripe as stripe_client,
};
use db::models::subscription::{PlanType, Provider};
use serde_json::{Value, json};
use stripe::{CheckoutSession, CheckoutSessionMode, CreateCheckoutSession, SubscriptionId};

/// Parameters of a hosted checkout, provider independent.
#[derive(Debug, Clone)]
pub struct CheckoutParams {
    pub price_id: String,
    pub plan_type: PlanType,
    pub user_id: String,
    pub email: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Outbound calls to the payment providers.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Schedules cancellation at the end of the current period and returns
    /// the provider's view of the subscription.
    async fn cancel_at_period_end(&self, provider: Provider, subscription_id: &str) -> Res<Value>;

    /// Returns the hosted checkout URL.
    async fn create_checkout(&self, provider: Provider, params: CheckoutParams) -> Res<String>;
}

/// Live clients built from configuration.
pub struct ProviderClients {
    paddle: PaddleClient,
    stripe: stripe::Client,
    stripe_configured: bool,
}

impl ProviderClients {
    pub fn from_config(config: &Config) -> Self {
        ProviderClients {
            paddle: paddle::create_client(&config.paddle_api_key, config.paddle_environment),
            stripe: stripe_client::create_client(&config.stripe_secret_key),
            stripe_configured: !config.stripe_secret_key.is_empty(),
        }
    }

    fn ensure_stripe(&self) -> Res<&stripe::Client> {
        if self.stripe_configured {
            Ok(&self.stripe)
        } else {
            log::error!("STRIPE_SECRET_KEY not configured");
            Err(AppError::Internal("Payment system not configured".to_string()))
        }
    }
}

#[async_trait]
impl BillingProvider for ProviderClients {
    async fn cancel_at_period_end(&self, provider: Provider, subscription_id: &str) -> Res<Value> {
        match provider {
            Provider::Paddle => self.paddle.cancel_subscription(subscription_id).await,
            Provider::Stripe => {
                let client = self.ensure_stripe()?;
                let sub_id = subscription_id
                    .parse::<SubscriptionId>()
                    .map_err(|e| AppError::BadRequest(format!("Invalid subscription ID: {}", e)))?;

                let subscription = stripe::Subscription::update(
                    client,
                    &sub_id,
                    stripe::UpdateSubscription {
                        cancel_at_period_end: Some(true),
                        ..Default::default()
                    },
                )
                .await
                .map_err(AppError::from)?;

                log::info!("Subscription canceled successfully: {}", subscription.id);
                Ok(json!({
                    "id": subscription.id.to_string(),
                    "status": subscription.status.as_str(),
                    "cancel_at_period_end": subscription.cancel_at_period_end,
                }))
            }
        }
    }

    async fn create_checkout(&self, provider: Provider, params: CheckoutParams) -> Res<String> {
        match provider {
            Provider::Paddle => {
                self.paddle
                    .create_checkout(&params.price_id, &params.user_id)
                    .await
            }
            Provider::Stripe => {
                let client = self.ensure_stripe()?;
                let mode = match params.plan_type {
                    PlanType::OneTime => CheckoutSessionMode::Payment,
                    PlanType::Monthly => CheckoutSessionMode::Subscription,
                };
                let metadata = [("userId".to_string(), params.user_id.clone())]
                    .into_iter()
                    .collect();

                let session = CheckoutSession::create(
                    client,
                    CreateCheckoutSession {
                        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
                            price: Some(params.price_id.clone()),
                            quantity: Some(1),
                            ..Default::default()
                        }]),
                        mode: Some(mode),
                        success_url: Some(params.success_url.as_str()),
                        cancel_url: Some(params.cancel_url.as_str()),
                        client_reference_id: Some(params.user_id.as_str()),
                        customer_email: params.email.as_deref(),
                        allow_promotion_codes: Some(true),
                        metadata: Some(metadata),
                        ..Default::default()
                    },
                )
                .await
                .map_err(AppError::from)?;

                session.url.ok_or_else(|| {
                    AppError::Internal(format!("Checkout session {} has no url", session.id))
                })
            }
        }
    }
}
