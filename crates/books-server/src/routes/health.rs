//! Liveness and store reachability.

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::Serialize;

use crate::state::AppState;

/// Body of GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when the book store answered, `unavailable` otherwise.
    pub status: &'static str,
    /// `up` or `down`.
    pub store: &'static str,
}

/// GET /health - Report whether the book store can serve requests.
///
/// # Response
///
/// - 200 OK: `{"status": "ok", "store": "up"}`
/// - 503 Service Unavailable: `{"status": "unavailable", "store": "down"}`
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                store: "up",
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Book store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    store: "down",
                }),
            )
        }
    }
}

/// Build health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
