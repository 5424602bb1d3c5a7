use std::sync::Arc;

use actix_web::{Responder, get, post, put, web};
use common::{error::Res, http::Success, jwt::AuthClaims};
use db::UsageStore;

use crate::{
    dtos::tools::{PricingInputs, TaskUpdateRequest},
    models::tool::ToolName,
    services,
};

/// Projects revenue for a pricing setup.
///
/// # Input
/// - `req`: `{"pricing_model": "one_time" | "subscription" | "both", "one_time_price": 49,
///   "monthly_price": 19, "annual_price": 0, "target_customers": 100,
///   "monthly_churn_rate": 5, "monthly_costs": 50, "customer_acquisition_cost": 10}`
///
/// # Output
/// - Success: `{"pricing_model": ..., "one_time"?: {...}, "subscription"?: {...}}`
/// - Error: 400 for negative amounts or a churn rate outside 0..=100
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/tools/pricing', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${session.access_token}`
///   },
///   body: JSON.stringify(inputs)
/// });
/// ```
#[post("/pricing")]
pub async fn post_pricing(
    claims: web::ReqData<AuthClaims>,
    req: web::Json<PricingInputs>,
    store: web::Data<Arc<dyn UsageStore>>,
) -> Res<impl Responder> {
    let projection = services::pricing::calculate(&req)?;

    // metering must not cost the user their result
    let recorded = services::usage::record_usage(
        store.get_ref().as_ref(),
        &claims.sub,
        ToolName::PricingCalculator,
    )
    .await;
    if let Err(e) = recorded {
        log::warn!("Failed to record pricing usage for {}: {}", claims.sub, e);
    }

    Success::ok(projection)
}

/// The 30-day launch checklist with the caller's progress.
#[get("/launch")]
pub async fn get_launch_plan(
    claims: web::ReqData<AuthClaims>,
    store: web::Data<Arc<dyn UsageStore>>,
) -> Res<impl Responder> {
    let plan = services::launch::get_launch_plan(store.get_ref().as_ref(), &claims.sub).await?;
    Success::ok(plan)
}

/// Marks one checklist day as done or open.
///
/// # Input
/// - `day`: 1 to 30
/// - `req`: `{"completed": true}`
///
/// # Output
/// - Success: the updated checklist, as for `GET /launch`
/// - Error: 404 for a day outside the checklist
#[put("/launch/{day}")]
pub async fn put_launch_task(
    claims: web::ReqData<AuthClaims>,
    day: web::Path<i32>,
    req: web::Json<TaskUpdateRequest>,
    store: web::Data<Arc<dyn UsageStore>>,
) -> Res<impl Responder> {
    let plan = services::launch::set_task_completed(
        store.get_ref().as_ref(),
        &claims.sub,
        day.into_inner(),
        req.completed,
    )
    .await?;
    Success::ok(plan)
}
