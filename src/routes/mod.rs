//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the agent and file endpoints plus the static upload directory under
//! a single Axum router. CORS is wide open; the API is meant to sit behind a
//! browser front end on another origin.

pub mod agent;
pub mod files;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::files::UPLOADS_URL_PREFIX;
use crate::state::AppState;

pub const INDEX_TEXT: &str = "Query agent server is running";

/// Full application router. `upload_max_bytes` caps request bodies.
pub fn app(state: AppState, upload_max_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let uploads = ServeDir::new(state.upload_dir.as_path());

    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/agent", post(agent::agent))
        .route("/api/ai/query", post(agent::ai_query))
        .route("/api/process-file", post(files::process_file))
        .route("/api/ai/upload", post(files::upload))
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(upload_max_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn index() -> &'static str {
    INDEX_TEXT
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
