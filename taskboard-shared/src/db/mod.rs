/// PostgreSQL plumbing
///
/// - `pool`: connection pool creation, health check, shutdown
/// - `migrations`: embedded schema migrations from the workspace `migrations/` directory
///
/// Queries live with their models in [`crate::models`].

pub mod migrations;
pub mod pool;
