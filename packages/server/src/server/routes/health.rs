use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    stream_log: StreamLogHealth,
    actions: usize,
    messages: usize,
}

#[derive(Serialize)]
pub struct StreamLogHealth {
    streams: usize,
    open_reader_connections: usize,
}

/// Health check endpoint
///
/// Reports liveness plus the gauges worth watching under load: open reader
/// connections (leaked blocking reads show up here) and store sizes.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let deps = &state.deps;

    let response = HealthResponse {
        status: "healthy".to_string(),
        stream_log: StreamLogHealth {
            streams: deps.stream_log.stream_count().await,
            open_reader_connections: deps.stream_log.open_reader_conns(),
        },
        actions: deps.actions.count().await,
        messages: deps.messages.message_count().await,
    };

    (StatusCode::OK, Json(response))
}
