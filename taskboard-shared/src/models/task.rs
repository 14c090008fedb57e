/// Task model and database operations
///
/// A task is a unit of work assigned to one or more users. It carries a
/// checklist of sub-items whose completion drives the task's `progress`
/// and, through the rules in [`crate::lifecycle`], its `status`.
///
/// # Status
///
/// ```text
/// Pending ──▶ In Progress ──▶ Completed
///    ▲             │               │
///    └─────────────┴───────────────┘   (explicit SetStatus)
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('Pending', 'In Progress', 'Completed');
/// CREATE TYPE task_priority AS ENUM ('Low', 'Medium', 'High');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     priority task_priority NOT NULL DEFAULT 'Medium',
///     status task_status NOT NULL DEFAULT 'Pending',
///     due_date TIMESTAMPTZ NOT NULL,
///     assigned_to UUID[] NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id),
///     todo_checklist JSONB NOT NULL DEFAULT '[]',
///     progress DOUBLE PRECISION NOT NULL DEFAULT 0,
///     attachments TEXT[] NOT NULL DEFAULT '{}',
///     version BIGINT NOT NULL DEFAULT 1,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{ChecklistItem, CreateTask, Task, TaskPriority};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let owner = Uuid::new_v4();
///
/// let task = Task::create(&pool, CreateTask {
///     title: "Write release notes".to_string(),
///     description: String::new(),
///     priority: TaskPriority::High,
///     due_date: Utc::now() + Duration::days(3),
///     assigned_to: vec![owner],
///     created_by: owner,
///     todo_checklist: vec![ChecklistItem::new("Draft"), ChecklistItem::new("Review")],
///     attachments: vec![],
/// }).await?;
///
/// assert_eq!(task.progress, 0.0);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::filter::TaskFilter;
use crate::lifecycle;

const TASK_COLUMNS: &str = "id, title, description, priority, status, due_date, assigned_to, \
     created_by, todo_checklist, progress, attachments, version, created_at, updated_at";

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    Pending,

    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,

    Completed,
}

impl TaskStatus {
    /// Every status, in display order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    /// Wire and database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown task status: {}", s))
    }
}

/// Task priority
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sub-item of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,

    #[serde(default)]
    pub completed: bool,
}

impl ChecklistItem {
    /// Creates an unchecked item
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }

    /// Creates an item with the given completion flag
    pub fn with_completed(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: text.into(),
            completed,
        }
    }
}

/// Task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    pub description: String,

    pub priority: TaskPriority,

    pub status: TaskStatus,

    pub due_date: DateTime<Utc>,

    /// Assignees; never empty
    pub assigned_to: Vec<Uuid>,

    /// Creator; set once at insert
    pub created_by: Uuid,

    pub todo_checklist: Vec<ChecklistItem>,

    /// Percentage in [0, 100], derived from the checklist
    pub progress: f64,

    /// Attachment URLs
    pub attachments: Vec<String>,

    /// Incremented on every write; used to reject lost updates
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Number of completed checklist items
    pub fn completed_todo_count(&self) -> usize {
        self.todo_checklist.iter().filter(|item| item.completed).count()
    }

    /// Whether `user_id` is one of the assignees
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assigned_to.contains(&user_id)
    }

    /// Whether the task is past due and not completed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.due_date < now
    }
}

/// Row shape as read from PostgreSQL
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: String,
    priority: TaskPriority,
    status: TaskStatus,
    due_date: DateTime<Utc>,
    assigned_to: Vec<Uuid>,
    created_by: Uuid,
    todo_checklist: Json<Vec<ChecklistItem>>,
    progress: f64,
    attachments: Vec<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            priority: row.priority,
            status: row.status,
            due_date: row.due_date,
            assigned_to: row.assigned_to,
            created_by: row.created_by,
            todo_checklist: row.todo_checklist.0,
            progress: row.progress,
            attachments: row.attachments,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a new task
///
/// Status and progress are not part of the input; they are derived from
/// `todo_checklist` on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Vec<Uuid>,
    pub created_by: Uuid,
    pub todo_checklist: Vec<ChecklistItem>,
    pub attachments: Vec<String>,
}

/// Projection used by the dashboards' recent-task lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for RecentTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

impl Task {
    /// Inserts a task, deriving its initial status and progress
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let (status, progress) = lifecycle::initial_state(&data.todo_checklist);

        let query = format!(
            "INSERT INTO tasks (title, description, priority, status, due_date, assigned_to,
                                created_by, todo_checklist, progress, attachments)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {TASK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(data.priority)
            .bind(status)
            .bind(data.due_date)
            .bind(data.assigned_to)
            .bind(data.created_by)
            .bind(Json(data.todo_checklist))
            .bind(progress)
            .bind(data.attachments)
            .fetch_one(pool)
            .await?;

        Ok(row.into())
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Task::from))
    }

    /// Writes every mutable field of `task` if the stored version still
    /// equals `task.version`
    ///
    /// Returns the stored task with its bumped version, or `None` when no row
    /// matched (either the task is gone or another write got there first).
    pub async fn save(pool: &PgPool, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET
                title = $1, description = $2, priority = $3, status = $4, due_date = $5,
                assigned_to = $6, todo_checklist = $7, progress = $8, attachments = $9,
                version = version + 1, updated_at = NOW()
             WHERE id = $10 AND version = $11
             RETURNING {TASK_COLUMNS}"
        );

        let row = sqlx::query_as::<_, TaskRow>(&query)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.due_date)
            .bind(&task.assigned_to)
            .bind(Json(&task.todo_checklist))
            .bind(task.progress)
            .bind(&task.attachments)
            .bind(task.id)
            .bind(task.version)
            .fetch_optional(pool)
            .await?;

        Ok(row.map(Task::from))
    }

    /// Deletes a task; returns whether a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists tasks matching `filter`, newest first
    pub async fn list(pool: &PgPool, filter: &TaskFilter) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        filter.push_where(&mut qb);
        qb.push(" ORDER BY created_at DESC, id");

        let rows = qb.build_query_as::<TaskRow>().fetch_all(pool).await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    /// Counts tasks matching `filter`
    pub async fn count(pool: &PgPool, filter: &TaskFilter) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        filter.push_where(&mut qb);

        qb.build_query_scalar::<i64>().fetch_one(pool).await
    }

    /// Counts tasks matching `filter`, grouped by status
    ///
    /// Statuses with no tasks are absent from the result.
    pub async fn count_by_status(
        pool: &PgPool,
        filter: &TaskFilter,
    ) -> Result<Vec<(TaskStatus, i64)>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT status, COUNT(*) FROM tasks");
        filter.push_where(&mut qb);
        qb.push(" GROUP BY status");

        qb.build_query_as::<(TaskStatus, i64)>().fetch_all(pool).await
    }

    /// Counts tasks matching `filter`, grouped by priority
    pub async fn count_by_priority(
        pool: &PgPool,
        filter: &TaskFilter,
    ) -> Result<Vec<(TaskPriority, i64)>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT priority, COUNT(*) FROM tasks");
        filter.push_where(&mut qb);
        qb.push(" GROUP BY priority");

        qb.build_query_as::<(TaskPriority, i64)>().fetch_all(pool).await
    }

    /// Most recently created tasks matching `filter`
    pub async fn recent(
        pool: &PgPool,
        filter: &TaskFilter,
        limit: i64,
    ) -> Result<Vec<RecentTask>, sqlx::Error> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, title, status, priority, due_date, created_at FROM tasks",
        );
        filter.push_where(&mut qb);
        qb.push(" ORDER BY created_at DESC, id LIMIT ").push_bind(limit);

        qb.build_query_as::<RecentTask>().fetch_all(pool).await
    }
}
