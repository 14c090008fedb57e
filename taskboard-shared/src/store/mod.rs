/// Storage seam for tasks and users
///
/// Handlers talk to storage only through the [`Store`] trait, which has two
/// implementations:
///
/// - [`postgres::PgStore`]: production storage over a sqlx `PgPool`
/// - [`memory::MemoryStore`]: process-local storage for tests and demos
///
/// Both apply [`TaskFilter`] identically, so visibility scoping behaves the
/// same whichever store is behind the API.
///
/// # Concurrency
///
/// Task writes are optimistic. [`TaskStore::save_task`] only succeeds when
/// the stored `version` still equals the version the caller read; otherwise
/// it fails with [`StoreError::VersionConflict`] and nothing is written.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::filter::TaskFilter;
/// use taskboard_shared::store::{memory::MemoryStore, TaskStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let tasks = store.list_tasks(&TaskFilter::all()).await?;
/// assert!(tasks.is_empty());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::filter::TaskFilter;
use crate::models::task::{CreateTask, RecentTask, Task, TaskPriority, TaskStatus};
use crate::models::user::{CreateUser, UpdateUser, User, UserRole};

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The task changed since it was read
    #[error("Task {0} was modified concurrently")]
    VersionConflict(Uuid),

    /// A unique constraint was violated (e.g. email already registered)
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Duplicate(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Inserts a task; status and progress are derived from its checklist
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Persists `task` if its version is current
    ///
    /// Returns `Ok(None)` if the task no longer exists and
    /// `Err(VersionConflict)` if it was modified since it was read. On
    /// success the returned task carries the new version.
    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>>;

    /// Returns whether a task was deleted
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Tasks matching `filter`, newest first
    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<i64>;

    /// Per-status counts; statuses without tasks may be omitted
    async fn count_by_status(&self, filter: &TaskFilter) -> StoreResult<Vec<(TaskStatus, i64)>>;

    /// Per-priority counts; priorities without tasks may be omitted
    async fn count_by_priority(
        &self,
        filter: &TaskFilter,
    ) -> StoreResult<Vec<(TaskPriority, i64)>>;

    /// The `limit` most recently created tasks matching `filter`
    async fn recent_tasks(&self, filter: &TaskFilter, limit: i64) -> StoreResult<Vec<RecentTask>>;
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Duplicate` when the email is already registered
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>>;

    /// All users, or only those with `role`, ordered by name
    async fn list_users(&self, role: Option<UserRole>) -> StoreResult<Vec<User>>;

    /// Users with the given ids; unknown ids are skipped
    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>>;
}

/// Complete storage backend
#[async_trait]
pub trait Store: TaskStore + UserStore {
    /// Name for logs and health output
    fn backend(&self) -> &'static str;

    /// Checks connectivity
    async fn ping(&self) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_unique_errors_map_to_database() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[test]
    fn test_error_messages() {
        let id = Uuid::new_v4();
        assert_eq!(
            StoreError::VersionConflict(id).to_string(),
            format!("Task {} was modified concurrently", id)
        );
        assert_eq!(
            StoreError::Duplicate("users_email_key".to_string()).to_string(),
            "Duplicate value for users_email_key"
        );
    }
}
