/// In-memory store
///
/// Keeps tasks and users in insertion order behind a single
/// `tokio::sync::RwLock`. It mirrors the PostgreSQL store's semantics:
/// case-insensitive unique emails, version-checked task writes, newest-first
/// listings, and the same [`TaskFilter`] predicates.
///
/// Used by the API integration tests and for running the server without a
/// database.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, TaskStore, UserStore};
use crate::filter::TaskFilter;
use crate::lifecycle;
use crate::models::task::{CreateTask, RecentTask, Task, TaskPriority, TaskStatus};
use crate::models::user::{CreateUser, UpdateUser, User, UserRole};

const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    users: Vec<User>,
}

impl Inner {
    /// Matching tasks, newest first; ties keep the later insert first
    fn newest_first(&self, filter: &TaskFilter) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().rev().filter(|t| filter.matches(t)).collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

/// Process-local [`Store`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let (status, progress) = lifecycle::initial_state(&data.todo_checklist);
        let now = Utc::now();

        let task = Task {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            priority: data.priority,
            status,
            due_date: data.due_date,
            assigned_to: data.assigned_to,
            created_by: data.created_by,
            todo_checklist: data.todo_checklist,
            progress,
            attachments: data.attachments,
            version: 1,
            created_at: now,
            updated_at: now,
        };

        self.inner.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let mut inner = self.inner.write().await;

        let Some(stored) = inner.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Ok(None);
        };
        if stored.version != task.version {
            return Err(StoreError::VersionConflict(task.id));
        }

        *stored = Task {
            id: stored.id,
            created_by: stored.created_by,
            created_at: stored.created_at,
            version: stored.version + 1,
            updated_at: Utc::now(),
            ..task.clone()
        };

        Ok(Some(stored.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        Ok(inner.tasks.len() < before)
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner.newest_first(filter).into_iter().cloned().collect())
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.iter().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn count_by_status(&self, filter: &TaskFilter) -> StoreResult<Vec<(TaskStatus, i64)>> {
        let inner = self.inner.read().await;

        let mut counts: HashMap<TaskStatus, i64> = HashMap::new();
        for task in inner.tasks.iter().filter(|t| filter.matches(t)) {
            *counts.entry(task.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_by_priority(
        &self,
        filter: &TaskFilter,
    ) -> StoreResult<Vec<(TaskPriority, i64)>> {
        let inner = self.inner.read().await;

        let mut counts: HashMap<TaskPriority, i64> = HashMap::new();
        for task in inner.tasks.iter().filter(|t| filter.matches(t)) {
            *counts.entry(task.priority).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn recent_tasks(&self, filter: &TaskFilter, limit: i64) -> StoreResult<Vec<RecentTask>> {
        let inner = self.inner.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(inner
            .newest_first(filter)
            .into_iter()
            .take(limit)
            .map(RecentTask::from)
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner.email_taken(&data.email, None) {
            return Err(StoreError::Duplicate(EMAIL_CONSTRAINT.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            profile_image_url: data.profile_image_url,
            created_at: now,
            updated_at: now,
        };

        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;

        if let Some(email) = &data.email {
            if inner.email_taken(email, Some(id)) {
                return Err(StoreError::Duplicate(EMAIL_CONSTRAINT.to_string()));
            }
        }

        let Some(user) = inner.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        data.apply_to(user);
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn list_users(&self, role: Option<UserRole>) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;

        let mut users: Vec<User> = inner
            .users
            .iter()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(users)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;

        let mut users: Vec<User> = inner
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
