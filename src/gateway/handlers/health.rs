//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use super::super::state::AppState;
use super::super::types::{HealthResponse, format_timestamp};

/// Health check endpoint
///
/// Pings the ledger store. The body never carries failure detail.
///
/// - Healthy: 200 OK + `{status: "healthy", timestamp}`
/// - Unhealthy: 503 Service Unavailable + `{status: "unhealthy", timestamp}`
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service healthy", body = HealthResponse, content_type = "application/json"),
        (status = 503, description = "Ledger store unreachable", body = HealthResponse)
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let (status, label) = match state.ledger.health_check().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            tracing::error!(store = state.ledger.name(), "[HEALTH] ledger ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            timestamp: format_timestamp(&Utc::now()),
        }),
    )
}
