use common::{
    env_config::Config,
    error::{AppError, Res},
    jwt::AuthClaims,
};
use db::models::subscription::{PlanType, Provider};

use crate::{
    dtos::billing::CheckoutRequest,
    services::provider::{BillingProvider, CheckoutParams},
};

/// Price used when the request does not name one.
fn default_price(config: &Config, provider: Provider, plan_type: PlanType) -> &str {
    match (provider, plan_type) {
        (Provider::Stripe, _) => &config.stripe_price_id,
        (Provider::Paddle, PlanType::OneTime) => &config.paddle_price_id_onetime,
        (Provider::Paddle, PlanType::Monthly) => &config.paddle_price_id_monthly,
    }
}

/// Builds checkout parameters for the caller and asks the provider for a URL.
pub async fn create_checkout(
    provider: &dyn BillingProvider,
    config: &Config,
    which: Provider,
    claims: &AuthClaims,
    req: CheckoutRequest,
) -> Res<String> {
    let price_id = req
        .price_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| default_price(config, which, req.plan_type).to_string());
    if price_id.is_empty() {
        return Err(AppError::BadRequest("Price ID is required".to_string()));
    }

    let app_url = config.app_url.trim_end_matches('/');
    let params = CheckoutParams {
        price_id,
        plan_type: req.plan_type,
        user_id: claims.sub.clone(),
        email: claims.email.clone(),
        success_url: format!("{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}", app_url),
        cancel_url: format!("{}/pricing", app_url),
    };

    log::info!(
        "Creating {} checkout for user {} ({})",
        which,
        params.user_id,
        params.plan_type.as_str()
    );
    provider.create_checkout(which, params).await
}
