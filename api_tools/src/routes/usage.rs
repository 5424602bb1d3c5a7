use std::sync::Arc;

use actix_web::{Responder, get, post, web};
use chrono::Utc;
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::AuthClaims,
};
use db::{BillingStore, UsageStore};

use crate::{dtos::tools::UsageRecorded, models::tool::ToolName, services};

fn parse_tool(raw: &str) -> Res<ToolName> {
    raw.parse().map_err(AppError::BadRequest)
}

/// Records one invocation of a dashboard tool.
///
/// # Output
/// - Success: `{"tool": "marketing_assets", "recorded": true}`
/// - Error: 400 for an unknown tool name
#[post("/{tool}")]
pub async fn post_usage(
    claims: web::ReqData<AuthClaims>,
    tool: web::Path<String>,
    store: web::Data<Arc<dyn UsageStore>>,
) -> Res<impl Responder> {
    let tool = parse_tool(&tool)?;
    services::usage::record_usage(store.get_ref().as_ref(), &claims.sub, tool).await?;
    Success::created(UsageRecorded {
        tool: tool.to_string(),
        recorded: true,
    })
}

/// Dashboard overview: tools tried, checklist progress and launch countdown.
#[get("/stats")]
pub async fn get_stats(
    claims: web::ReqData<AuthClaims>,
    store: web::Data<Arc<dyn UsageStore>>,
) -> Res<impl Responder> {
    let stats =
        services::usage::get_usage_stats(store.get_ref().as_ref(), &claims.sub, Utc::now()).await?;
    Success::ok(stats)
}

/// Free-tier state of one tool for the paywall prompt.
///
/// # Output
/// - Success: `{"allowed", "used", "limit", "remaining", "near_limit",
///   "limit_reached", "is_pro"}`
/// - Error: 400 for an unknown tool name
#[get("/{tool}/gate")]
pub async fn get_gate(
    claims: web::ReqData<AuthClaims>,
    tool: web::Path<String>,
    usage: web::Data<Arc<dyn UsageStore>>,
    billing: web::Data<Arc<dyn BillingStore>>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let tool = parse_tool(&tool)?;
    let gate = services::usage::get_usage_gate(
        usage.get_ref().as_ref(),
        billing.get_ref().as_ref(),
        &claims.sub,
        tool,
        config.free_tier_limit,
    )
    .await?;
    Success::ok(gate)
}
