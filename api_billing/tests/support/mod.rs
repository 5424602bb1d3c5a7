#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use actix_web::test::TestRequest;
use api_billing::{BillingProvider, CheckoutParams, services::signature::compute_signature};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::{ClaimsSpec, generate_jwt},
};
use db::models::subscription::Provider;
use serde_json::{Value, json};

pub const PADDLE_SECRET: &str = "pdl_ntfset_test_secret";
pub const STRIPE_SECRET: &str = "whsec_test";
pub const JWT_SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

pub fn config() -> Arc<Config> {
    Arc::new(Config {
        jwt_secret: JWT_SECRET.to_string(),
        paddle_webhook_secret: PADDLE_SECRET.to_string(),
        stripe_webhook_secret: STRIPE_SECRET.to_string(),
        paddle_price_id_onetime: "pri_once".to_string(),
        paddle_price_id_monthly: "pri_month".to_string(),
        stripe_price_id: "price_default".to_string(),
        app_url: "https://launch.example.com/".to_string(),
        ..Default::default()
    })
}

pub fn bearer(user_id: &str) -> (&'static str, String) {
    let token = generate_jwt(
        ClaimsSpec {
            user_id: user_id.to_string(),
            email: Some(format!("{}@example.com", user_id)),
        },
        JWT_SECRET,
        "authenticated",
        1,
    )
    .unwrap();
    ("Authorization", format!("Bearer {}", token))
}

/// POST to the Paddle webhook signed `age_secs` seconds ago.
pub fn paddle_request(body: &Value, age_secs: i64) -> TestRequest {
    let raw = serde_json::to_vec(body).unwrap();
    let ts = (Utc::now().timestamp() - age_secs).to_string();
    let h1 = compute_signature(PADDLE_SECRET, &ts, &raw).unwrap();
    TestRequest::post()
        .uri("/api/webhooks/paddle")
        .insert_header(("paddle-signature", format!("ts={};h1={}", ts, h1)))
        .insert_header(("content-type", "application/json"))
        .set_payload(raw)
}

pub fn subscription_created(event_id: &str) -> Value {
    json!({
        "event_id": event_id,
        "event_type": "subscription.created",
        "occurred_at": "2025-01-01T00:00:05Z",
        "data": {
            "id": "sub_1",
            "custom_data": { "userId": "u1" },
            "status": "active",
            "items": [{ "price": { "id": "p1" } }],
            "current_billing_period": { "starts_at": "2025-01-01", "ends_at": "2025-02-01" }
        }
    })
}

/// POST to the Stripe webhook with a fresh `t=..,v1=..` signature.
pub fn stripe_request(event: &Value) -> TestRequest {
    let payload = serde_json::to_string(event).unwrap();
    let t = Utc::now().timestamp();
    let mut mac = Hmac::<Sha256>::new_from_slice(STRIPE_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}.{}", t, payload).as_bytes());
    let v1 = hex::encode(mac.finalize().into_bytes());
    TestRequest::post()
        .uri("/api/webhooks/stripe")
        .insert_header(("stripe-signature", format!("t={},v1={}", t, v1)))
        .insert_header(("content-type", "application/json"))
        .set_payload(payload)
}

fn stripe_event(event_id: &str, event_type: &str, object: Value) -> Value {
    json!({
        "id": event_id,
        "object": "event",
        "api_version": "2024-06-20",
        "created": 1735689600,
        "livemode": false,
        "pending_webhooks": 1,
        "type": event_type,
        "data": { "object": object }
    })
}

/// `checkout.session.completed` for a `payment` or `subscription` mode session
/// referencing user u1 through `client_reference_id`.
pub fn stripe_checkout_completed(event_id: &str, mode: &str, subscription_id: Option<&str>) -> Value {
    let amount_total = if mode == "payment" { 4900 } else { 1900 };
    stripe_event(
        event_id,
        "checkout.session.completed",
        json!({
            "id": "cs_test_1",
            "object": "checkout.session",
            "amount_total": amount_total,
            "automatic_tax": { "enabled": false },
            "client_reference_id": "u1",
            "created": 1735689600,
            "currency": "usd",
            "custom_fields": [],
            "custom_text": {},
            "customer": "cus_1",
            "expires_at": 1735776000,
            "livemode": false,
            "metadata": { "userId": "u1" },
            "mode": mode,
            "payment_method_types": ["card"],
            "payment_status": "paid",
            "shipping_options": [],
            "status": "complete",
            "subscription": subscription_id
        }),
    )
}

/// `customer.subscription.updated` or `.deleted` for `subscription_id`.
pub fn stripe_subscription_event(
    event_id: &str,
    event_type: &str,
    subscription_id: &str,
    status: &str,
) -> Value {
    stripe_event(
        event_id,
        event_type,
        json!({
            "id": subscription_id,
            "object": "subscription",
            "automatic_tax": { "enabled": false },
            "billing_cycle_anchor": 1735689600,
            "cancel_at_period_end": false,
            "created": 1735689600,
            "currency": "usd",
            "current_period_end": 1738368000,
            "current_period_start": 1735689600,
            "customer": "cus_1",
            "items": {
                "object": "list",
                "data": [],
                "has_more": false,
                "url": "/v1/subscription_items"
            },
            "livemode": false,
            "metadata": {},
            "start_date": 1735689600,
            "status": status
        }),
    )
}

/// Records provider calls and answers with a canned result.
pub struct MockProvider {
    calls: AtomicUsize,
    failure_status: Option<u16>,
    last_checkout: Mutex<Option<(Provider, CheckoutParams)>>,
    cancels: Mutex<Vec<(Provider, String)>>,
}

impl MockProvider {
    pub fn ok() -> Self {
        MockProvider {
            calls: AtomicUsize::new(0),
            failure_status: None,
            last_checkout: Mutex::new(None),
            cancels: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        MockProvider {
            failure_status: Some(status),
            ..Self::ok()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_checkout(&self) -> Option<(Provider, CheckoutParams)> {
        self.last_checkout.lock().unwrap().clone()
    }

    /// Subscriptions passed to `cancel_at_period_end`, in call order.
    pub fn cancels(&self) -> Vec<(Provider, String)> {
        self.cancels.lock().unwrap().clone()
    }

    fn answer<T>(&self, value: T) -> Res<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure_status {
            Some(status) => Err(AppError::Provider {
                status,
                message: "Failed to cancel subscription with Paddle".to_string(),
            }),
            None => Ok(value),
        }
    }
}

#[async_trait]
impl BillingProvider for MockProvider {
    async fn cancel_at_period_end(&self, provider: Provider, subscription_id: &str) -> Res<Value> {
        self.cancels
            .lock()
            .unwrap()
            .push((provider, subscription_id.to_string()));
        self.answer(json!({
            "provider": provider.as_str(),
            "id": subscription_id,
            "scheduled_change": { "action": "cancel" },
        }))
    }

    async fn create_checkout(&self, provider: Provider, params: CheckoutParams) -> Res<String> {
        *self.last_checkout.lock().unwrap() = Some((provider, params));
        self.answer(format!("https://checkout.example.com/{}", provider))
    }
}

/// Webhooks under `/api/webhooks`, account routes under `/api/dashboard`
/// behind the auth middleware, as the server mounts them.
macro_rules! billing_app {
    ($store:expr, $provider:expr) => {{
        let config = support::config();
        let store: std::sync::Arc<dyn db::BillingStore> = $store;
        let provider: std::sync::Arc<dyn api_billing::BillingProvider> = $provider;
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(store))
                .app_data(actix_web::web::Data::new(provider))
                .app_data(actix_web::web::Data::new(config.clone()))
                .service(
                    actix_web::web::scope("/api")
                        .service(api_billing::mount_webhooks())
                        .service(
                            actix_web::web::scope("/dashboard")
                                .wrap(api_auth::auth_middleware(config))
                                .service(api_billing::mount_billing()),
                        ),
                ),
        )
        .await
    }};
}
