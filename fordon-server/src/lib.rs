//! fordon-server library - Fordonsfil registry service
//!
//! Ingests fixed-width vehicle registry files into SQLite and serves the
//! records through a JSON API plus an embedded browser UI.

use axum::http::{header, Method};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod ingest;
pub mod parser;
pub mod validate;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    // The browser UI is served from the same origin, but the registry is
    // also queried by other in-house tools, so CORS stays permissive
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(api::serve_index))
        .route("/static/app.js", get(api::serve_app_js))
        .route("/static/style.css", get(api::serve_style_css))
        .route("/api/upload", post(api::upload_file))
        .route("/api/vehicles", get(api::get_vehicles))
        .route("/api/stats", get(api::get_stats))
        .merge(api::health_routes())
        .fallback(error::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
