//! Liveness check.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::web::dto::HealthResponse;
use crate::web::handlers::AppState;

/// GET /health
///
/// Answers 503 when the database cannot be queried.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.message_service().count().await {
        Ok(message_count) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                message_count,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    message_count: 0,
                }),
            )
        }
    }
}
