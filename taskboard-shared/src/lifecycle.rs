/// Task status and progress rules
///
/// `progress` is never written directly. It is always derived from the
/// checklist by [`derive_progress`]:
///
/// ```text
/// progress = 100 * completed / total      when total > 0
///          = 100                          when total = 0 and status = Completed
///          = 0                            otherwise
/// ```
///
/// The two mutating operations differ in which side drives the other:
///
/// - [`replace_checklist`]: the checklist drives the status
///   (100 → Completed, 0 → Pending, anything between → In Progress).
/// - [`set_status`]: the status is an explicit override. Completed checks
///   every item, Pending unchecks every item, In Progress leaves the
///   checklist as it is. Progress is then re-derived.
///
/// Both require the caller to be an admin or an assignee of the task.
/// Neither touches `version`; the store bumps it on save.

use crate::auth::authorization::{require_task_access, AuthzError};
use crate::auth::middleware::AuthContext;
use crate::models::task::{ChecklistItem, Task, TaskStatus};

/// Error type for lifecycle operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    /// Checklist item at this index has blank text
    #[error("Checklist item {0} must have text")]
    BlankItem(usize),
}

/// Percentage of completed items; 0 for an empty checklist
pub fn compute_progress(checklist: &[ChecklistItem]) -> f64 {
    if checklist.is_empty() {
        return 0.0;
    }

    let completed = checklist.iter().filter(|item| item.completed).count();
    (completed as f64 / checklist.len() as f64) * 100.0
}

/// Status implied by a progress value
pub fn status_for_progress(progress: f64) -> TaskStatus {
    if progress >= 100.0 {
        TaskStatus::Completed
    } else if progress > 0.0 {
        TaskStatus::InProgress
    } else {
        TaskStatus::Pending
    }
}

/// Progress of a task with this checklist and status
pub fn derive_progress(checklist: &[ChecklistItem], status: TaskStatus) -> f64 {
    if checklist.is_empty() && status == TaskStatus::Completed {
        100.0
    } else {
        compute_progress(checklist)
    }
}

/// Status and progress for a newly created task
pub fn initial_state(checklist: &[ChecklistItem]) -> (TaskStatus, f64) {
    let progress = compute_progress(checklist);
    (status_for_progress(progress), progress)
}

/// Rejects checklist items with blank text
pub fn validate_checklist(checklist: &[ChecklistItem]) -> Result<(), LifecycleError> {
    match checklist.iter().position(|item| item.text.trim().is_empty()) {
        Some(index) => Err(LifecycleError::BlankItem(index)),
        None => Ok(()),
    }
}

/// Sets the task's status explicitly
pub fn set_status(
    task: &mut Task,
    status: TaskStatus,
    actor: &AuthContext,
) -> Result<(), LifecycleError> {
    require_task_access(actor, task)?;

    match status {
        TaskStatus::Completed => task
            .todo_checklist
            .iter_mut()
            .for_each(|item| item.completed = true),
        TaskStatus::Pending => task
            .todo_checklist
            .iter_mut()
            .for_each(|item| item.completed = false),
        TaskStatus::InProgress => {}
    }

    task.status = status;
    task.progress = derive_progress(&task.todo_checklist, status);
    Ok(())
}

/// Replaces the checklist wholesale and re-derives progress and status
pub fn replace_checklist(
    task: &mut Task,
    checklist: Vec<ChecklistItem>,
    actor: &AuthContext,
) -> Result<(), LifecycleError> {
    require_task_access(actor, task)?;
    validate_checklist(&checklist)?;

    let progress = compute_progress(&checklist);
    task.todo_checklist = checklist;
    task.progress = progress;
    task.status = status_for_progress(progress);
    Ok(())
}
