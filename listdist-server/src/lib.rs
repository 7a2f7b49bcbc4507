//! listdist-server library
//!
//! Contact-list upload service: parses uploaded CSV/XLSX/XLS lists, spreads
//! the records across the agent roster and serves the resulting
//! per-agent distributions.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod ingest;

pub use error::{ApiError, ApiResult};

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Scratch directory for staged uploads
    pub uploads_dir: PathBuf,
    /// Upload size ceiling in bytes (file content only)
    pub max_upload_bytes: u64,
    /// Bearer token required on /api routes; `None` disables auth
    pub api_token: Option<Arc<str>>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        uploads_dir: PathBuf,
        max_upload_bytes: u64,
        api_token: Option<String>,
    ) -> Self {
        Self {
            db,
            uploads_dir,
            max_upload_bytes,
            api_token: api_token.map(Arc::from),
        }
    }
}

/// Build application router
///
/// `/api/*` sits behind the bearer check; `/` and `/health` do not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    let body_limit = usize::try_from(state.max_upload_bytes + MULTIPART_OVERHEAD_BYTES)
        .unwrap_or(usize::MAX);

    // Protected routes (require authentication)
    let protected = Router::new()
        .route(
            "/api/upload",
            post(api::upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/upload/distributions", get(api::get_distributions))
        .route("/api/agents", get(api::list_agents).post(api::create_agent))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
