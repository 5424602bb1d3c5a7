use std::sync::Arc;

use actix_web::{HttpRequest, Responder, post, web};
use chrono::Utc;
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
};
use db::{BillingStore, models::subscription::Provider};

use crate::{
    dtos::billing::WebhookAck,
    models::{
        paddle::{PaddleEnvelope, PaddleEvent},
        stripe::StripeEvent,
    },
    services::{self, signature},
};

/// Handles Paddle Billing notifications.
///
/// # Input
/// - `body`: raw request body, verified byte for byte
/// - `req`: HTTP request carrying the `Paddle-Signature` header (`ts=..;h1=..`)
/// - `store`: subscription and event ledger storage
/// - `config`: application configuration with `PADDLE_WEBHOOK_SECRET`
///
/// # Output
/// - Success: `200 {"received": true}` for processed, duplicate, ignored
///   and failed-to-apply events alike, so Paddle stops retrying
/// - Error: 401 for a missing, malformed, stale or wrong signature;
///   400 for a body that is not a valid event
///
/// # Paddle Configuration Example
/// 1. Paddle Dashboard → Developer Tools → Notifications
/// 2. Add destination: https://yourapp.com/api/webhooks/paddle
/// 3. Subscribe to transaction.completed and subscription.*
/// 4. Copy the secret key into PADDLE_WEBHOOK_SECRET
#[post("/paddle")]
pub async fn post_paddle_webhook(
    body: web::Bytes,
    req: HttpRequest,
    store: web::Data<Arc<dyn BillingStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let header = req
        .headers()
        .get("paddle-signature")
        .and_then(|value| value.to_str().ok());
    signature::verify_paddle_signature(
        &config.paddle_webhook_secret,
        header,
        &body,
        Utc::now().timestamp(),
    )?;

    let envelope: PaddleEnvelope = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid webhook body: {}", e)))?;
    log::info!(
        "Received verified Paddle webhook: {} (occurred at {})",
        envelope.event_type,
        envelope.occurred_at.as_deref().unwrap_or("unknown")
    );

    let event_id = envelope.event_id.clone();
    let event_type = envelope.event_type.clone();
    let event = PaddleEvent::parse(envelope)?;

    let store = store.get_ref().as_ref();
    services::webhook::process_once(
        store,
        Provider::Paddle,
        &event_id,
        &event_type,
        services::paddle::reconcile(store, &config, event),
    )
    .await;

    Success::ok(WebhookAck { received: true })
}

/// Handles Stripe webhook events.
///
/// # Input
/// - `payload`: raw request body, verified as received
/// - `req`: HTTP request carrying the `Stripe-Signature` header (`t=..,v1=..`)
/// - `store`: subscription and event ledger storage
/// - `config`: application configuration with `STRIPE_WEBHOOK_SECRET`
///
/// # Output
/// - Success: `200 {"received": true}` for processed, duplicate, ignored
///   and failed-to-apply events alike, so Stripe stops retrying
/// - Error: 400 for a missing, stale or wrong signature, or a body that is
///   not a Stripe event
///
/// # Example Event Types Handled
/// - checkout.session.completed: records the purchase for the session's user
/// - customer.subscription.updated: mirrors status, period and cancel flag
/// - customer.subscription.deleted: marks the subscription canceled
#[post("/stripe")]
pub async fn post_stripe_webhook(
    payload: String,
    req: HttpRequest,
    store: web::Data<Arc<dyn BillingStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let signature = match req.headers().get("stripe-signature") {
        Some(signature) => signature.to_str().unwrap_or(""),
        None => return Err(AppError::BadRequest("Stripe signature missing".to_string())),
    };

    let event =
        services::stripe::construct_event(&payload, signature, &config.stripe_webhook_secret)?;
    let event_id = event.id.to_string();
    let event_type = event.type_.to_string();
    log::info!("Processing webhook event: {}", event_type);

    let store = store.get_ref().as_ref();
    services::webhook::process_once(
        store,
        Provider::Stripe,
        &event_id,
        &event_type,
        services::stripe::reconcile(store, StripeEvent::from(event)),
    )
    .await;

    Success::ok(WebhookAck { received: true })
}
