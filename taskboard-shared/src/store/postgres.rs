/// PostgreSQL store
///
/// Thin adapter from the [`Store`] traits onto the model queries in
/// [`crate::models`]. The one piece of logic here is telling a lost
/// optimistic update apart from a deleted task after a zero-row `UPDATE`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskStore, UserStore};
use crate::db::pool::health_check;
use crate::filter::TaskFilter;
use crate::models::task::{CreateTask, RecentTask, Task, TaskPriority, TaskStatus};
use crate::models::user::{CreateUser, UpdateUser, User, UserRole};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let task = Task::create(&self.pool, data).await?;
        debug!(task_id = %task.id, "Inserted task");
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        if let Some(saved) = Task::save(&self.pool, task).await? {
            return Ok(Some(saved));
        }

        match Task::find_by_id(&self.pool, task.id).await? {
            Some(current) => {
                warn!(
                    task_id = %task.id,
                    expected_version = task.version,
                    current_version = current.version,
                    "Rejected stale task write"
                );
                Err(StoreError::VersionConflict(task.id))
            }
            None => Ok(None),
        }
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        Ok(Task::list(&self.pool, filter).await?)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<i64> {
        Ok(Task::count(&self.pool, filter).await?)
    }

    async fn count_by_status(&self, filter: &TaskFilter) -> StoreResult<Vec<(TaskStatus, i64)>> {
        Ok(Task::count_by_status(&self.pool, filter).await?)
    }

    async fn count_by_priority(
        &self,
        filter: &TaskFilter,
    ) -> StoreResult<Vec<(TaskPriority, i64)>> {
        Ok(Task::count_by_priority(&self.pool, filter).await?)
    }

    async fn recent_tasks(&self, filter: &TaskFilter, limit: i64) -> StoreResult<Vec<RecentTask>> {
        Ok(Task::recent(&self.pool, filter, limit).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        Ok(User::update(&self.pool, id, data).await?)
    }

    async fn list_users(&self, role: Option<UserRole>) -> StoreResult<Vec<User>> {
        Ok(User::list(&self.pool, role).await?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        Ok(User::find_by_ids(&self.pool, ids).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
