/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::{app::{build_router, AppState}, config::Config};
/// use taskdesk_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let app = build_router(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self as axum_middleware, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskdesk_shared::auth::middleware::{authenticate, bearer_token};
use taskdesk_shared::avatar::MAX_AVATAR_BYTES;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Headroom for multipart boundaries and part headers around the avatar file
const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

/// Shared application state
///
/// Cloned into every handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Session token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET    /health
/// ├── /users
/// │   ├── POST   /                 register (public)
/// │   ├── POST   /login            (public)
/// │   ├── GET    /:id/avatar       (public)
/// │   ├── POST   /logout
/// │   ├── POST   /logoutAll
/// │   ├── GET    /me
/// │   ├── PATCH  /me
/// │   ├── DELETE /me
/// │   ├── POST   /me/avatar
/// │   └── DELETE /me/avatar
/// └── /tasks
///     ├── POST   /
///     ├── GET    /                 ?completed&limit&skip&sort
///     ├── GET    /:id
///     ├── PATCH  /:id
///     └── DELETE /:id
/// ```
///
/// Everything not marked public sits behind [`session_auth_layer`].
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::register))
        .route("/users/login", post(routes::users::login))
        .route("/users/:id/avatar", get(routes::avatar::get_avatar));

    let user_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::get_me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(routes::avatar::upload_avatar)
                .delete(routes::avatar::delete_avatar)
                .layer(DefaultBodyLimit::max(
                    MAX_AVATAR_BYTES + MULTIPART_OVERHEAD_BYTES,
                )),
        );

    let task_routes = Router::new()
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        );

    // route_layer: unmatched paths stay 404 instead of turning into 401
    let protected_routes = user_routes.merge(task_routes).route_layer(
        axum_middleware::from_fn_with_state(state.clone(), session_auth_layer),
    );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CompressionLayer::new())
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
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
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Session authentication middleware layer
///
/// Resolves the bearer token to a user holding it as an active session and
/// injects [`AuthContext`](taskdesk_shared::auth::middleware::AuthContext)
/// into request extensions. Any failure is a 401 before the handler runs.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?.to_string();
    let auth = authenticate(&state.db, state.jwt_secret(), &token).await?;

    tracing::debug!(user_id = %auth.user.id, "Request authenticated");
    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
