use chrono::{DateTime, Utc};
use common::error::Res;
use db::{BillingStore, UsageStore};

use crate::{
    dtos::tools::{UsageGate, UsageStats},
    models::{
        launch::{LAUNCH_TASKS, progress_percentage},
        tool::ToolName,
    },
};

/// Days of the launch countdown.
const LAUNCH_WINDOW_DAYS: i64 = 30;
/// Share of the free quota, in percent, from which the gate warns.
const NEAR_LIMIT_PERCENT: i64 = 80;

pub async fn record_usage(store: &dyn UsageStore, user_id: &str, tool: ToolName) -> Res<()> {
    store.record_usage(user_id, tool.as_str()).await?;
    log::debug!("Recorded {} usage for user {}", tool, user_id);
    Ok(())
}

// whole days since `since`, any started day counts
fn days_since(since: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - since).num_milliseconds().abs();
    (millis + 86_399_999) / 86_400_000
}

pub async fn get_usage_stats(
    store: &dyn UsageStore,
    user_id: &str,
    now: DateTime<Utc>,
) -> Res<UsageStats> {
    let counts = store.usage_counts(user_id).await?;
    let tools_used = ToolName::ALL
        .iter()
        .filter(|tool| counts.get(tool.as_str()).is_some_and(|count| *count > 0))
        .count();

    let completed_tasks = store.completed_task_days(user_id).await?.len();
    let total_tasks = LAUNCH_TASKS.len();

    let days_active = store
        .first_usage_at(user_id)
        .await?
        .map(|first| days_since(first, now))
        .unwrap_or(0);

    Ok(UsageStats {
        tools_used,
        total_tools: ToolName::ALL.len(),
        completed_tasks,
        total_tasks,
        launch_progress: progress_percentage(completed_tasks, total_tasks),
        days_active,
        days_until_launch: (LAUNCH_WINDOW_DAYS - days_active).max(0),
    })
}

/// Pure quota evaluation. `limit` is the free allowance per tool.
pub fn evaluate_gate(used: i64, limit: i64, is_pro: bool) -> UsageGate {
    let limit_reached = used >= limit;
    let near_limit = if limit > 0 {
        used * 100 >= limit * NEAR_LIMIT_PERCENT
    } else {
        true
    };

    UsageGate {
        allowed: is_pro || !limit_reached,
        used,
        limit,
        remaining: (limit - used).max(0),
        near_limit,
        limit_reached,
        is_pro,
    }
}

/// Advisory paywall state for one tool. Nothing is refused based on it.
pub async fn get_usage_gate(
    usage: &dyn UsageStore,
    billing: &dyn BillingStore,
    user_id: &str,
    tool: ToolName,
    free_limit: i64,
) -> Res<UsageGate> {
    let used = usage
        .usage_counts(user_id)
        .await?
        .get(tool.as_str())
        .copied()
        .unwrap_or(0);

    let is_pro = billing
        .get_subscription_by_user(user_id)
        .await?
        .and_then(|subscription| subscription.current_status())
        .is_some_and(|status| status.grants_access());

    Ok(evaluate_gate(used, free_limit, is_pro))
}
