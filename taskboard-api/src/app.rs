/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::{db::pool::connect, store::postgres::PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = connect(&config.database).await?;
/// let state = AppState::new(Arc::new(PgStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use taskboard_shared::{
    auth::{jwt::TokenIssuer, middleware::authenticate},
    service::Kanban,
    store::Store,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Board operations over the configured store
    pub kanban: Arc<Kanban<dyn Store>>,

    /// Issues and verifies bearer tokens
    pub tokens: Arc<TokenIssuer>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            kanban: Arc::new(Kanban::new(store, config.ordering.max_retries)),
            tokens: Arc::new(TokenIssuer::new(config.jwt.clone())),
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── GET  /health                       (public)
/// ├── POST /register, POST /login        (public)
/// ├── /boards, /boards/:id               (bearer)
/// │   ├── /share, /share/:user_id
/// │   ├── /columns, /columns/reorder
/// │   └── /labels
/// ├── /shared-boards                     (bearer)
/// ├── /columns, /columns/:id, /columns/:id/tasks
/// ├── /tasks, /tasks/:id
/// │   ├── /move, /assign, /due-date
/// │   └── /labels, /labels/:label_id
/// └── /labels, /labels/:id, /labels/:id/tasks
/// ```
///
/// # Middleware Stack
///
/// Outermost first:
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Bearer authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{auth, boards, columns, health, labels, shares, tasks};

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let protected_routes = Router::new()
        // Boards
        .route("/boards", post(boards::create_board).get(boards::list_boards))
        .route(
            "/boards/:id",
            get(boards::get_board).put(boards::update_board).delete(boards::delete_board),
        )
        .route("/shared-boards", get(shares::shared_boards))
        // Shares
        .route("/boards/:id/share", post(shares::share_board).get(shares::list_collaborators))
        .route("/boards/:id/share/:user_id", delete(shares::unshare_board))
        // Columns
        .route("/columns", post(columns::create_column))
        .route("/boards/:id/columns", get(columns::list_columns))
        .route("/boards/:id/columns/reorder", post(columns::reorder_columns))
        .route(
            "/columns/:id",
            get(columns::get_column).put(columns::update_column).delete(columns::delete_column),
        )
        // Tasks
        .route("/tasks", post(tasks::create_task))
        .route("/columns/:id/tasks", get(tasks::list_tasks))
        .route(
            "/tasks/:id",
            get(tasks::get_task).put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/tasks/:id/move", post(tasks::move_task))
        .route("/tasks/:id/assign", post(tasks::assign_task).delete(tasks::unassign_task))
        .route("/tasks/:id/due-date", post(tasks::set_due_date))
        .route("/tasks/:id/labels", get(labels::task_labels))
        .route(
            "/tasks/:id/labels/:label_id",
            post(labels::attach_label).delete(labels::detach_label),
        )
        // Labels
        .route("/labels", post(labels::create_label))
        .route("/boards/:id/labels", get(labels::list_labels))
        .route(
            "/labels/:id",
            get(labels::get_label).put(labels::update_label).delete(labels::delete_label),
        )
        .route("/labels/:id/tasks", get(labels::tasks_with_label))
        .route_layer(middleware::from_fn_with_state(state.clone(), bearer_auth_layer));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.allows_any_origin() {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
}

/// Bearer authentication middleware layer
///
/// Verifies the token and injects the caller's `AuthContext` into the
/// request extensions.
async fn bearer_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = authenticate(&state.tokens, req.headers()).map_err(|err| {
        tracing::debug!("Rejected request: {}", err.message());
        ApiError::from(err)
    })?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
