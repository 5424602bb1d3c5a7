use common::error::{AppError, Res};
use db::UsageStore;

use crate::{
    dtos::tools::{LaunchPlanResponse, LaunchTaskView},
    models::launch::{LAUNCH_TASKS, find_task, progress_percentage},
};

/// The checklist with the user's completion flags.
pub async fn get_launch_plan(store: &dyn UsageStore, user_id: &str) -> Res<LaunchPlanResponse> {
    let completed_days = store.completed_task_days(user_id).await?;

    let tasks: Vec<LaunchTaskView> = LAUNCH_TASKS
        .iter()
        .map(|task| LaunchTaskView {
            day: task.day,
            title: task.title,
            description: task.description,
            category: task.category,
            completed: completed_days.contains(&task.day),
        })
        .collect();

    let completed_tasks = tasks.iter().filter(|task| task.completed).count();
    Ok(LaunchPlanResponse {
        completed_tasks,
        total_tasks: tasks.len(),
        progress: progress_percentage(completed_tasks, tasks.len()),
        tasks,
    })
}

pub async fn set_task_completed(
    store: &dyn UsageStore,
    user_id: &str,
    day: i32,
    completed: bool,
) -> Res<LaunchPlanResponse> {
    let task = find_task(day)
        .ok_or_else(|| AppError::NotFound(format!("No launch task for day {}", day)))?;

    store.set_task_completed(user_id, task.day, completed).await?;
    log::info!(
        "User {} marked day {} as {}",
        user_id,
        day,
        if completed { "done" } else { "open" }
    );

    get_launch_plan(store, user_id).await
}
