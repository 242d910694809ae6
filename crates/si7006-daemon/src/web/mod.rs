//! HTTP attribute endpoints.
//!
//! The chip is published as `hwmon0`: `/hwmon0/name` plus one plaintext
//! endpoint per attribute file, and a JSON snapshot of everything at `/`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use si7006_hw::Error;
use std::sync::Arc;

use crate::state::AppState;

/// Creates the web router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/hwmon0/name", get(name))
        .route("/hwmon0/:attr", get(attribute))
        .with_state(state)
}

/// Maps a read failure to the closest HTTP status.
fn status_for(error: &Error) -> StatusCode {
    match error {
        e if e.is_not_supported() => StatusCode::NOT_FOUND,
        Error::NoData { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET / - JSON snapshot of every attribute
async fn index(State(state): State<Arc<AppState>>) -> Response {
    match tokio::task::spawn_blocking(move || state.snapshot()).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Read task failed: {}", e),
        )
            .into_response(),
    }
}

/// GET /hwmon0/name - Chip name
async fn name(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    format!("{}\n", state.name())
}

/// GET /hwmon0/:attr - One attribute file, sysfs style
async fn attribute(State(state): State<Arc<AppState>>, Path(attr): Path<String>) -> Response {
    let result = tokio::task::spawn_blocking(move || state.read_attribute(&attr)).await;

    match result {
        Ok(Ok(value)) => (StatusCode::OK, format!("{}\n", value)).into_response(),
        Ok(Err(e)) => (status_for(&e), format!("{}\n", e)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Read task failed: {}", e),
        )
            .into_response(),
    }
}
