//! Test utilities and common setup.

use axum::Router;
use tempfile::TempDir;

use chathub::config::Config;
use chathub::routes;
use chathub::storage::{create_store, StoreConfig};
use chathub::ws::ChatHub;
use chathub::AppState;

/// Create a test application backed by a temp-dir object store.
///
/// The `TempDir` must be kept alive for the duration of the test.
pub async fn test_app() -> (Router, AppState, TempDir) {
    test_app_with_config(Config::default()).await
}

/// Same as [`test_app`] but with a caller-supplied config.
pub async fn test_app_with_config(config: Config) -> (Router, AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();

    let store = create_store(StoreConfig::Local {
        root: temp_dir.path().to_path_buf(),
        bucket: config.bucket.clone(),
    });
    store.ensure_bucket().await.unwrap();

    let hub = ChatHub::start();
    let state = AppState::new(hub, store, config);

    let app = Router::new()
        .merge(routes::app_routes(
            temp_dir.path(),
            state.config.max_upload_size,
        ))
        .with_state(state.clone());

    (app, state, temp_dir)
}

/// Build a multipart/form-data body with a username field and one file.
pub fn multipart_body(
    boundary: &str,
    username: Option<&str>,
    file_name: &str,
    file_bytes: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();

    if let Some(username) = username {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"username\"\r\n\r\n{username}\r\n"
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file_bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    body
}
