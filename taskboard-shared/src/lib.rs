//! # Taskboard Shared Library
//!
//! Domain types, persistence, and business rules used by the Taskboard API.
//!
//! ## Module Organization
//!
//! - `models`: Task and user records plus their PostgreSQL queries
//! - `lifecycle`: Status and progress rules for checklist and status updates
//! - `filter`: Role-based visibility scoping for task queries
//! - `dashboard`: Fixed-shape summaries and dashboard aggregation
//! - `store`: Storage seam (PostgreSQL and in-memory implementations)
//! - `auth`: Passwords, JWTs, request auth context, authorization checks
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod dashboard;
pub mod db;
pub mod filter;
pub mod lifecycle;
pub mod models;
pub mod store;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
