//! Plain HTTP endpoints.

use crate::server::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Body of `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    /// Liveness message.
    pub message: String,
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `"running"` while the server answers.
    pub status: String,
    /// Number of live WebSocket clients.
    pub clients: usize,
    /// Server version.
    pub version: String,
}

/// Liveness check.
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Medical Transcription API is running".to_string(),
    })
}

/// Reports the number of connected clients.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
        clients: state.service.connection_count(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
