/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh and profile
/// - `tasks`: Task CRUD, status and checklist updates
/// - `dashboard`: Admin and per-user dashboards
/// - `users`: User directory

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod tasks;
pub mod users;
