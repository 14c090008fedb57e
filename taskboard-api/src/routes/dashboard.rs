/// Dashboard endpoints
///
/// - `GET /api/tasks/dashboard-data` - Every task (admin only)
/// - `GET /api/tasks/user-dashboard-data` - Tasks assigned to the caller
///
/// Both return the same shape:
///
/// ```json
/// {
///   "statistics": { "totalTasks": 4, "pendingTasks": 2, "inProgressTasks": 1, "completedTasks": 1, "overdueTasks": 1 },
///   "charts": {
///     "taskDistribution": { "Pending": 2, "InProgress": 1, "Completed": 1, "All": 4 },
///     "taskPriorityLevels": { "Low": 1, "Medium": 2, "High": 1 }
///   },
///   "recentTasks": [ { "id": "uuid", "title": "...", "status": "Pending", ... } ]
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use chrono::Utc;
use taskboard_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    dashboard::{build_dashboard, DashboardData},
    filter::{visible_to, TaskFilter},
};

/// Global dashboard
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
pub async fn admin_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardData>> {
    require_admin(&auth)?;

    let scope = visible_to(&auth, TaskFilter::all());
    let data = build_dashboard(state.store.as_ref(), &scope, Utc::now()).await?;

    Ok(Json(data))
}

/// Dashboard over the caller's assigned tasks, admins included
pub async fn user_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<DashboardData>> {
    let scope = TaskFilter::all().with_assignee(auth.user_id);
    let data = build_dashboard(state.store.as_ref(), &scope, Utc::now()).await?;

    tracing::debug!(user_id = %auth.user_id, total = data.statistics.total_tasks, "User dashboard built");

    Ok(Json(data))
}
