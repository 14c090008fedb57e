/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks?status=` - List visible tasks with a status summary
/// - `GET /api/tasks/:id` - Fetch one task
/// - `POST /api/tasks` - Create a task
/// - `PUT /api/tasks/:id` - Partially update a task
/// - `DELETE /api/tasks/:id` - Delete a task (admin)
/// - `PUT /api/tasks/:id/status` - Set status (assignee or admin)
/// - `PUT /api/tasks/:id/todo` - Replace checklist (assignee or admin)
///
/// Every listing is scoped with [`visible_to`]: members only ever see the
/// tasks assigned to them.
///
/// Task responses embed assignee summaries (`id`, `name`, `email`,
/// `profileImageUrl`) in `assignedTo` and add `completedTodoCount`.
///
/// Mutating endpoints accept an optional `version`. When present it must
/// equal the stored version, otherwise the request fails with 409 before
/// anything is written.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use taskboard_shared::{
    auth::{
        authorization::{require_admin, require_task_access},
        middleware::AuthContext,
    },
    dashboard::StatusSummary,
    filter::{visible_to, TaskFilter},
    lifecycle,
    models::{
        task::{ChecklistItem, CreateTask, Task, TaskPriority, TaskStatus},
        user::UserSummary,
    },
    store::{Store, StoreError},
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Task as returned by the API
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Vec<UserSummary>,
    pub created_by: Uuid,
    pub todo_checklist: Vec<ChecklistItem>,
    pub completed_todo_count: usize,
    pub progress: f64,
    pub attachments: Vec<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    /// Assignees missing from `users` are omitted
    fn new(task: Task, users: &HashMap<Uuid, UserSummary>) -> Self {
        let completed_todo_count = task.completed_todo_count();
        let assigned_to = task
            .assigned_to
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect();

        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            assigned_to,
            created_by: task.created_by,
            todo_checklist: task.todo_checklist,
            completed_todo_count,
            progress: task.progress,
            attachments: task.attachments,
            version: task.version,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Task list response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskResponse>,

    /// Counts over every visible task, regardless of the status filter
    pub summary: StatusSummary,
}

/// Response of mutating endpoints
#[derive(Debug, Serialize)]
pub struct TaskMutationResponse {
    pub message: String,
    pub task: TaskResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(
        length(max = 200, message = "Title must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,

    /// Kept untyped so a non-array value gets a precise error
    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<Value>,

    #[serde(default, rename = "todoChecklist")]
    pub todo_checklist: Vec<ChecklistItem>,

    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Partial task update; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(
        length(max = 200, message = "Title must be at most 200 characters"),
        custom(function = "not_blank")
    )]
    pub title: Option<String>,

    pub description: Option<String>,
    pub priority: Option<TaskPriority>,

    #[serde(rename = "dueDate")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(rename = "assignedTo")]
    pub assigned_to: Option<Value>,

    #[serde(rename = "todoChecklist")]
    pub todo_checklist: Option<Vec<ChecklistItem>>,

    pub attachments: Option<Vec<String>>,

    pub version: Option<i64>,
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
    pub version: Option<i64>,
}

/// Checklist replacement request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChecklistRequest {
    pub todo_checklist: Vec<ChecklistItem>,
    pub version: Option<i64>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Title is required".into());
        return Err(err);
    }
    Ok(())
}

/// Parses `?status=`; an empty value means no filter
fn parse_status_filter(raw: Option<&str>) -> ApiResult<Option<TaskStatus>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|msg: String| ApiError::invalid_field("status", msg)),
    }
}

/// Parses `assignedTo` into distinct user ids, keeping request order
fn parse_assignees(value: Option<&Value>) -> ApiResult<Vec<Uuid>> {
    let Some(Value::Array(items)) = value else {
        return Err(ApiError::BadRequest(
            "assignedTo must be an array of user Ids".to_string(),
        ));
    };

    if items.is_empty() {
        return Err(ApiError::BadRequest(
            "assignedTo must contain at least one user".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = item
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid user id in assignedTo: {}", item))
            })?;
        if seen.insert(id) {
            ids.push(id);
        }
    }

    Ok(ids)
}

/// Parses `assignedTo` and checks every id names an existing user
async fn resolve_assignees(store: &dyn Store, value: Option<&Value>) -> ApiResult<Vec<Uuid>> {
    let ids = parse_assignees(value)?;

    let known: HashSet<Uuid> = store.find_users(&ids).await?.iter().map(|u| u.id).collect();
    if let Some(missing) = ids.iter().find(|id| !known.contains(id)) {
        return Err(ApiError::BadRequest(format!(
            "Unknown user in assignedTo: {}",
            missing
        )));
    }

    Ok(ids)
}

/// Loads assignee summaries for `tasks` in one batch
async fn populate(store: &dyn Store, tasks: Vec<Task>) -> ApiResult<Vec<TaskResponse>> {
    let ids: Vec<Uuid> = tasks
        .iter()
        .flat_map(|t| t.assigned_to.iter().copied())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let users: HashMap<Uuid, UserSummary> = store
        .find_users(&ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::from(u)))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| TaskResponse::new(task, &users))
        .collect())
}

async fn populate_one(store: &dyn Store, task: Task) -> ApiResult<TaskResponse> {
    populate(store, vec![task])
        .await?
        .pop()
        .ok_or_else(|| ApiError::InternalError("Task population returned nothing".to_string()))
}

async fn load_task(store: &dyn Store, id: Uuid) -> ApiResult<Task> {
    store
        .find_task(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Rejects a request made against an outdated copy of the task
fn check_version(task: &Task, expected: Option<i64>) -> ApiResult<()> {
    match expected {
        Some(version) if version != task.version => {
            Err(StoreError::VersionConflict(task.id).into())
        }
        _ => Ok(()),
    }
}

/// Saves `task` conditioned on the version it was read at
async fn persist(store: &dyn Store, task: &Task) -> ApiResult<Task> {
    store
        .save_task(task)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

async fn mutation_response(
    store: &dyn Store,
    message: &str,
    task: Task,
) -> ApiResult<Json<TaskMutationResponse>> {
    Ok(Json(TaskMutationResponse {
        message: message.to_string(),
        task: populate_one(store, task).await?,
    }))
}

/// Lists the caller's visible tasks, newest first
///
/// # Endpoint
///
/// ```text
/// GET /api/tasks?status=In%20Progress
/// ```
///
/// # Response
///
/// ```json
/// {
///   "tasks": [ { "id": "uuid", "title": "...", "assignedTo": [ ... ], "completedTodoCount": 1, ... } ],
///   "summary": { "all": 3, "pendingTasks": 1, "inProgressTasks": 1, "completedTasks": 1 }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status value
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListTasksQuery>,
) -> ApiResult<Json<TaskListResponse>> {
    let status = parse_status_filter(query.status.as_deref())?;

    let scope = visible_to(&auth, TaskFilter::all());
    let filter = match status {
        Some(status) => scope.clone().with_status(status),
        None => scope.clone(),
    };

    let store = state.store.as_ref();
    let tasks = store.list_tasks(&filter).await?;
    let summary = StatusSummary::load(store, &scope).await?;

    Ok(Json(TaskListResponse {
        tasks: populate(store, tasks).await?,
        summary,
    }))
}

/// Fetches one task with assignee details
///
/// # Errors
///
/// - `404 Not Found`: No such task
pub async fn get_task(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let store = state.store.as_ref();
    let task = load_task(store, id).await?;

    Ok(Json(populate_one(store, task).await?))
}

/// Creates a task owned by the caller
///
/// Status and progress are derived from the initial checklist.
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Content-Type: application/json
///
/// {
///   "title": "Ship release",
///   "priority": "High",
///   "dueDate": "2025-03-01T00:00:00Z",
///   "assignedTo": ["uuid"],
///   "todoChecklist": [{ "text": "Tag", "completed": false }]
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed, or `assignedTo` is not a
///   non-empty array of existing user ids
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskMutationResponse>)> {
    req.validate()?;
    lifecycle::validate_checklist(&req.todo_checklist)?;

    let store = state.store.as_ref();
    let assigned_to = resolve_assignees(store, req.assigned_to.as_ref()).await?;

    let task = store
        .insert_task(CreateTask {
            title: req.title.trim().to_string(),
            description: req.description,
            priority: req.priority,
            due_date: req.due_date,
            assigned_to,
            created_by: auth.user_id,
            todo_checklist: req.todo_checklist,
            attachments: req.attachments,
        })
        .await?;

    tracing::info!(task_id = %task.id, user_id = %auth.user_id, "Task created");

    let response = mutation_response(store, "Task created successfully", task).await?;
    Ok((StatusCode::CREATED, response))
}

/// Partially updates a task
///
/// A `todoChecklist` in the body replaces the checklist under the same
/// rules as `PUT /api/tasks/:id/todo`, including its authorization check.
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Checklist change by a non-assignee
/// - `404 Not Found`: No such task
/// - `409 Conflict`: Task changed concurrently
pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskMutationResponse>> {
    req.validate()?;

    let store = state.store.as_ref();
    let mut task = load_task(store, id).await?;
    check_version(&task, req.version)?;

    // Checklist access is decided by the stored assignees, not the edited ones
    if req.todo_checklist.is_some() {
        require_task_access(&auth, &task)?;
    }

    if let Some(title) = req.title {
        task.title = title.trim().to_string();
    }
    if let Some(description) = req.description {
        task.description = description;
    }
    if let Some(priority) = req.priority {
        task.priority = priority;
    }
    if let Some(due_date) = req.due_date {
        task.due_date = due_date;
    }
    if let Some(attachments) = req.attachments {
        task.attachments = attachments;
    }
    if req.assigned_to.is_some() {
        task.assigned_to = resolve_assignees(store, req.assigned_to.as_ref()).await?;
    }
    if let Some(checklist) = req.todo_checklist {
        lifecycle::replace_checklist(&mut task, checklist, &auth)?;
    }

    let task = persist(store, &task).await?;
    tracing::info!(task_id = %task.id, user_id = %auth.user_id, version = task.version, "Task updated");

    mutation_response(store, "Task updated successfully", task).await
}

/// Deletes a task
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not an admin
/// - `404 Not Found`: No such task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    require_admin(&auth)?;

    if !state.store.delete_task(id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %id, user_id = %auth.user_id, "Task deleted");

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}

/// Sets a task's status
///
/// `Completed` checks every checklist item and `Pending` unchecks them;
/// `In Progress` keeps the checklist. Progress is re-derived either way.
///
/// # Endpoint
///
/// ```text
/// PUT /api/tasks/:id/status
/// Content-Type: application/json
///
/// { "status": "Completed" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Unknown status
/// - `403 Forbidden`: Caller is neither an assignee nor an admin
/// - `404 Not Found`: No such task
/// - `409 Conflict`: Task changed concurrently
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<TaskMutationResponse>> {
    let store = state.store.as_ref();
    let mut task = load_task(store, id).await?;
    check_version(&task, req.version)?;

    lifecycle::set_status(&mut task, req.status, &auth)?;

    let task = persist(store, &task).await?;
    tracing::info!(task_id = %task.id, status = %task.status, "Task status updated");

    mutation_response(store, "Task status updated successfully", task).await
}

/// Replaces a task's checklist
///
/// Progress becomes the completed share of the new checklist and the status
/// follows from it.
///
/// # Endpoint
///
/// ```text
/// PUT /api/tasks/:id/todo
/// Content-Type: application/json
///
/// { "todoChecklist": [{ "text": "Tag", "completed": true }] }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Blank checklist item
/// - `403 Forbidden`: Caller is neither an assignee nor an admin
/// - `404 Not Found`: No such task
/// - `409 Conflict`: Task changed concurrently
pub async fn update_checklist(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateChecklistRequest>,
) -> ApiResult<Json<TaskMutationResponse>> {
    let store = state.store.as_ref();
    let mut task = load_task(store, id).await?;
    check_version(&task, req.version)?;

    lifecycle::replace_checklist(&mut task, req.todo_checklist, &auth)?;

    let task = persist(store, &task).await?;
    tracing::info!(
        task_id = %task.id,
        progress = task.progress,
        status = %task.status,
        "Task checklist updated"
    );

    mutation_response(store, "Task checklist updated successfully", task).await
}
