/// User directory endpoints
///
/// - `GET /api/users` - Members with their task counts (admin only)
/// - `GET /api/users/:id` - One user's profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiPath,
};
use axum::{extract::State, Extension, Json};
use futures::future::try_join_all;
use serde::Serialize;
use taskboard_shared::{
    auth::{authorization::require_admin, middleware::AuthContext},
    dashboard::StatusSummary,
    filter::TaskFilter,
    models::user::{User, UserRole},
};
use uuid::Uuid;

/// Member with per-status counts of the tasks assigned to them
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTaskCounts {
    #[serde(flatten)]
    pub user: User,

    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
}

impl UserWithTaskCounts {
    fn new(user: User, summary: StatusSummary) -> Self {
        Self {
            user,
            pending_tasks: summary.pending_tasks,
            in_progress_tasks: summary.in_progress_tasks,
            completed_tasks: summary.completed_tasks,
        }
    }
}

/// Lists members with their task counts
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<UserWithTaskCounts>>> {
    require_admin(&auth)?;

    let store = state.store.as_ref();
    let members = store.list_users(Some(UserRole::Member)).await?;

    let users = try_join_all(members.into_iter().map(|member| async move {
        let scope = TaskFilter::all().with_assignee(member.id);
        let summary = StatusSummary::load(store, &scope).await?;
        Ok::<_, ApiError>(UserWithTaskCounts::new(member, summary))
    }))
    .await?;

    Ok(Json(users))
}

/// Fetches one user
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}
