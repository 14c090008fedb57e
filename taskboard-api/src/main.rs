//! # Taskboard API Server
//!
//! REST backend for the Taskboard task manager: accounts, tasks with
//! checklists, role-scoped listings and dashboards.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/taskboard JWT_SECRET=... cargo run -p taskboard-api
//! ```
//!
//! `DATABASE_URL=memory://` runs against a process-local store instead of
//! PostgreSQL.

use std::sync::Arc;

use sqlx::PgPool;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::Config;
use taskboard_shared::db::{migrations, pool};
use taskboard_shared::store::{memory::MemoryStore, postgres::PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Taskboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let (store, db): (Arc<dyn Store>, Option<PgPool>) = if config.database.is_memory() {
        tracing::warn!("Using in-memory store; data is lost on shutdown");
        (Arc::new(MemoryStore::new()), None)
    } else {
        migrations::ensure_database_exists(&config.database.url).await?;

        let db = pool::create_pool(pool::DatabaseConfig {
            url: config.database.url.clone(),
            max_connections: config.database.max_connections,
            ..Default::default()
        })
        .await?;

        migrations::run_migrations(&db).await?;
        (Arc::new(PgStore::new(db.clone())), Some(db))
    };

    tracing::info!(backend = store.backend(), "Store ready");

    let addr = config.bind_address();
    let app = build_router(AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        pool::close_pool(&db).await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
