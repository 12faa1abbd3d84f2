/// Application state and router builder
///
/// The state and router are generic over the repository so the same routes
/// serve PostgreSQL in production and the in-process store in tests.
///
/// # Example
///
/// ```no_run
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::{db::pool::create_pool, store::PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(PgStore::new(pool));
/// let app = build_router(state, &config.api.cors_origins);
///
/// let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use taskboard_shared::services::{ProjectService, TaskService, UserService};
use taskboard_shared::store::Store;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::routes;

/// Shared application state
///
/// Cloned for each request by axum's `State` extractor; every service
/// shares the one store handle.
#[derive(Debug, Clone)]
pub struct AppState<S> {
    /// Repository handle, used directly by the health check
    pub store: S,
    pub users: UserService<S>,
    pub projects: ProjectService<S>,
    pub tasks: TaskService<S>,
}

impl<S: Store> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            users: UserService::new(store.clone()),
            projects: ProjectService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            store,
        }
    }
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health
/// └── /v1/
///     ├── GET, POST          /users
///     ├── GET                /users/:id
///     ├── GET, POST          /projects
///     ├── GET, PATCH, DELETE /projects/:id
///     ├── POST               /projects/:id/invite
///     ├── GET, POST          /projects/:id/tasks
///     ├── PATCH, DELETE      /tasks/:id
///     └── POST, DELETE       /tasks/:id/assignee
/// ```
pub fn build_router<S: Store>(state: AppState<S>, cors_origins: &[String]) -> Router {
    let user_routes = Router::new()
        .route(
            "/",
            get(routes::users::list_users::<S>).post(routes::users::create_user::<S>),
        )
        .route("/:id", get(routes::users::get_user::<S>));

    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects::<S>).post(routes::projects::create_project::<S>),
        )
        .route(
            "/:id",
            get(routes::projects::get_project::<S>)
                .patch(routes::projects::update_project::<S>)
                .delete(routes::projects::delete_project::<S>),
        )
        .route("/:id/invite", post(routes::projects::invite_member::<S>))
        .route(
            "/:id/tasks",
            get(routes::tasks::list_tasks::<S>).post(routes::tasks::create_task::<S>),
        );

    let task_routes = Router::new()
        .route(
            "/:id",
            axum::routing::patch(routes::tasks::update_task::<S>)
                .delete(routes::tasks::delete_task::<S>),
        )
        .route(
            "/:id/assignee",
            post(routes::tasks::assign_task::<S>).delete(routes::tasks::unassign_task::<S>),
        );

    let v1_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes);

    Router::new()
        .route("/health", get(routes::health::health_check::<S>))
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Permissive when `*` is listed, otherwise restricted to the given origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
