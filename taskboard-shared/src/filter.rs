/// Task query scoping
///
/// Every task read goes through a [`TaskFilter`]. Role-based visibility is
/// applied in exactly one place, [`visible_to`], which turns the caller's
/// base filter into the effective one: admins keep the filter as given,
/// everyone else is additionally restricted to tasks assigned to them.
///
/// A filter renders to SQL for the PostgreSQL store and evaluates directly
/// against a [`Task`] for the in-memory store, so both stores agree.

use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::middleware::AuthContext;
use crate::models::task::{Task, TaskStatus};

/// Conjunction of optional task predicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks with this status
    pub status: Option<TaskStatus>,

    /// Only tasks whose assignees include this user
    pub assignee: Option<Uuid>,

    /// Only tasks not completed and due before this instant
    pub overdue_at: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// Filter matching every task
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_assignee(mut self, user_id: Uuid) -> Self {
        self.assignee = Some(user_id);
        self
    }

    pub fn overdue_at(mut self, now: DateTime<Utc>) -> Self {
        self.overdue_at = Some(now);
        self
    }

    /// Evaluates the filter against an in-memory task
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(user_id) = self.assignee {
            if !task.is_assigned_to(user_id) {
                return false;
            }
        }
        if let Some(now) = self.overdue_at {
            if !task.is_overdue(now) {
                return false;
            }
        }
        true
    }

    /// Appends a `WHERE` clause for this filter to `qb`
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(user_id) = self.assignee {
            qb.push(" AND ").push_bind(user_id).push(" = ANY(assigned_to)");
        }
        if let Some(now) = self.overdue_at {
            qb.push(" AND status <> 'Completed' AND due_date < ")
                .push_bind(now);
        }
    }
}

/// Restricts `base` to what `actor` may see
///
/// Non-admins are always pinned to their own assignments, overriding any
/// assignee the caller may have put in `base`.
pub fn visible_to(actor: &AuthContext, base: TaskFilter) -> TaskFilter {
    if actor.is_admin() {
        base
    } else {
        base.with_assignee(actor.user_id)
    }
}
