/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::AppState, config::Config};
/// use taskboard_shared::store::memory::MemoryStore;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = taskboard_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskboard_shared::auth::middleware::authenticate;
use taskboard_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Task and user storage
    pub store: Arc<dyn Store>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register         # public
///     │   ├── POST /login            # public
///     │   ├── POST /refresh          # public
///     │   ├── GET  /profile
///     │   └── PUT  /profile
///     ├── /tasks/
///     │   ├── GET    /dashboard-data       # admin
///     │   ├── GET    /user-dashboard-data
///     │   ├── GET    /                     # ?status=
///     │   ├── POST   /
///     │   ├── GET    /:id
///     │   ├── PUT    /:id
///     │   ├── DELETE /:id                  # admin
///     │   ├── PUT    /:id/status           # assignee or admin
///     │   └── PUT    /:id/todo             # assignee or admin
///     └── /users/
///         ├── GET /                        # admin
///         └── GET /:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-router basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let auth_layer = axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer);

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let profile_routes = Router::new()
        .route(
            "/profile",
            get(routes::auth::get_profile).put(routes::auth::update_profile),
        )
        .layer(auth_layer.clone());

    let task_routes = Router::new()
        .route("/dashboard-data", get(routes::dashboard::admin_dashboard))
        .route("/user-dashboard-data", get(routes::dashboard::user_dashboard))
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/status", put(routes::tasks::update_status))
        .route("/:id/todo", put(routes::tasks::update_checklist))
        .layer(auth_layer.clone());

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .layer(auth_layer);

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(profile_routes))
        .nest("/tasks", task_routes)
        .nest("/users", user_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, loads its user and injects an
/// [`AuthContext`](taskboard_shared::auth::middleware::AuthContext) into
/// request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(state.store.as_ref(), state.jwt_secret(), req.headers()).await?;

    tracing::debug!(user_id = %auth.user_id, role = %auth.role, "Request authenticated");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
