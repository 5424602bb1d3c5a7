use serde::{Deserialize, Serialize};

use crate::models::launch::TaskCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    OneTime,
    Subscription,
    Both,
}

/// Calculator inputs. Currency values are whole units, churn is a percentage.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingInputs {
    pub pricing_model: PricingModel,
    #[serde(default)]
    pub one_time_price: f64,
    #[serde(default)]
    pub monthly_price: f64,
    #[serde(default)]
    pub annual_price: f64,
    pub target_customers: f64,
    pub monthly_churn_rate: f64,
    pub monthly_costs: f64,
    pub customer_acquisition_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OneTimeProjection {
    pub total_revenue: i64,
    pub net_revenue: i64,
    pub profit_margin: f64,
    pub break_even_customers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionProjection {
    pub month1_revenue: i64,
    pub month6_revenue: i64,
    pub month12_revenue: i64,
    pub avg_monthly_revenue: i64,
    pub customer_lifetime_value: i64,
    pub total_annual_revenue: i64,
    pub net_annual_revenue: i64,
    pub profit_margin: f64,
    pub break_even_customers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingProjection {
    pub pricing_model: PricingModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_time: Option<OneTimeProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionProjection>,
}

#[derive(Debug, Serialize)]
pub struct LaunchTaskView {
    pub day: i32,
    pub title: &'static str,
    pub description: &'static str,
    pub category: TaskCategory,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct LaunchPlanResponse {
    pub tasks: Vec<LaunchTaskView>,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub progress: i64,
}

#[derive(Debug, Deserialize)]
pub struct TaskUpdateRequest {
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct UsageRecorded {
    pub tool: String,
    pub recorded: bool,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct UsageStats {
    pub tools_used: usize,
    pub total_tools: usize,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub launch_progress: i64,
    pub days_active: i64,
    pub days_until_launch: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct UsageGate {
    pub allowed: bool,
    pub used: i64,
    pub limit: i64,
    pub remaining: i64,
    pub near_limit: bool,
    pub limit_reached: bool,
    pub is_pro: bool,
}
