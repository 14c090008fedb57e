/// Authorization checks
///
/// Taskboard has two roles and one resource-level rule:
///
/// 1. **Admin**: may do everything, including deleting tasks, reading the
///    global dashboard, and listing users
/// 2. **Member**: may act on a task only if they are one of its assignees
///
/// The checks are binary: a caller is either allowed the whole operation
/// or gets [`AuthzError`], never a partial result.
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::{require_admin, require_task_access};
/// use taskboard_shared::auth::middleware::AuthContext;
/// use taskboard_shared::models::task::Task;
///
/// fn check(auth: &AuthContext, task: &Task) -> Result<(), Box<dyn std::error::Error>> {
///     require_task_access(auth, task)?;
///     require_admin(auth)?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::task::Task;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Operation requires the admin role
    #[error("Access denied, admin only")]
    AdminOnly,

    /// Caller is neither admin nor an assignee of the task
    #[error("Not authorized to update task {0}")]
    NotAssigned(Uuid),
}

/// Requires the admin role
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    if !auth.is_admin() {
        return Err(AuthzError::AdminOnly);
    }

    Ok(())
}

/// Requires the caller to be an admin or one of the task's assignees
pub fn require_task_access(auth: &AuthContext, task: &Task) -> Result<(), AuthzError> {
    if auth.is_admin() || task.is_assigned_to(auth.user_id) {
        return Ok(());
    }

    Err(AuthzError::NotAssigned(task.id))
}
