use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::services::{ServeDir, ServeFile};

use crate::files;
use crate::ws;
use crate::AppState;

/// Build the application routes.
///
/// `max_upload_size` of zero disables the body limit.
pub fn app_routes(static_dir: &Path, max_upload_size: usize) -> Router<AppState> {
    let body_limit = if max_upload_size == 0 {
        DefaultBodyLimit::disable()
    } else {
        DefaultBodyLimit::max(max_upload_size)
    };

    Router::new()
        // Health check
        .route("/health", get(health))
        // Chat
        .route("/ws", get(ws::ws_handler))
        // File sharing
        .route("/upload", post(files::upload))
        .route("/download/{key}", get(files::download))
        .layer(body_limit)
        // Browser UI
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(static_dir))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
