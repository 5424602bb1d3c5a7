use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use common::{env_config::Config, error::Res, http::Success, jwt::AuthClaims};
use db::{BillingStore, models::subscription::Provider};

use crate::{
    dtos::billing::{CheckoutRequest, CheckoutResponse, SubscriptionResponse},
    services::{self, provider::BillingProvider},
};

/// Retrieves the authenticated user's subscription.
///
/// # Output
/// - Success: `{"subscription": {...}}` with plan, status, provider ids and period
/// - Error: 404 when the user never purchased
#[get("/subscription")]
pub async fn get_subscription(
    claims: web::ReqData<AuthClaims>,
    store: web::Data<Arc<dyn BillingStore>>,
) -> Res<impl Responder> {
    let subscription =
        services::sub::get_user_subscription(store.get_ref().as_ref(), &claims.sub).await?;
    Success::ok(SubscriptionResponse { subscription })
}

/// Cancels the user's monthly subscription at the end of the billing period.
///
/// # Input
/// - `claims`: access token claims, `sub` is the user id
///
/// # Output
/// - Success: `{"success": true, "message": "...", "data": <provider response>}`
/// - Error: 404 without a subscription, 400 for one-time purchases or a row
///   without provider subscription id, the provider's status when it refuses,
///   500 when the payment system is not configured
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/billing/cancel', {
///   method: 'POST',
///   headers: { 'Authorization': `Bearer ${session.access_token}` }
/// });
/// ```
#[post("/cancel")]
pub async fn post_cancel(
    claims: web::ReqData<AuthClaims>,
    store: web::Data<Arc<dyn BillingStore>>,
    provider: web::Data<Arc<dyn BillingProvider>>,
) -> Res<impl Responder> {
    let response = services::sub::cancel_subscription(
        store.get_ref().as_ref(),
        provider.get_ref().as_ref(),
        &claims.sub,
    )
    .await?;
    Success::ok(response)
}

/// Creates a Stripe Checkout session for the authenticated user.
///
/// # Input
/// - `req`: `{"plan_type": "one_time" | "monthly", "price_id"?: "price_..."}`
///
/// # Output
/// - Success: `{"url": "https://checkout.stripe.com/..."}`
#[post("/checkout/stripe")]
pub async fn post_stripe_checkout(
    claims: web::ReqData<AuthClaims>,
    req: web::Json<CheckoutRequest>,
    provider: web::Data<Arc<dyn BillingProvider>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let url = services::checkout::create_checkout(
        provider.get_ref().as_ref(),
        &config,
        Provider::Stripe,
        &claims,
        req.into_inner(),
    )
    .await?;
    Success::ok(CheckoutResponse { url })
}

/// Creates a Paddle transaction and returns its hosted checkout URL.
#[post("/checkout/paddle")]
pub async fn post_paddle_checkout(
    claims: web::ReqData<AuthClaims>,
    req: web::Json<CheckoutRequest>,
    provider: web::Data<Arc<dyn BillingProvider>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let url = services::checkout::create_checkout(
        provider.get_ref().as_ref(),
        &config,
        Provider::Paddle,
        &claims,
        req.into_inner(),
    )
    .await?;
    Success::ok(CheckoutResponse { url })
}
