//! Liveness and readiness probes.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tally_db::Connector;

use crate::state::AppState;

/// The process is up. Never touches the database.
pub async fn live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "alive" })))
}

/// The database answers `SELECT 1` (initializing the schema first if startup
/// could not).
pub async fn ready<C: Connector>(State(state): State<AppState<C>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(error) => {
            tracing::warn!(%error, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "message": error.to_string() })),
            )
        }
    }
}
