/// Database models for Taskboard
///
/// # Models
///
/// - `user`: Accounts, roles, and public profile projections
/// - `task`: Tasks with checklists, priorities, and derived progress
///
/// Each model owns its SQL. Handlers reach these queries through the
/// [`crate::store`] traits so the API can also run against the in-memory store.

pub mod task;
pub mod user;
