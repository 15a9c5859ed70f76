//! HTTP gateway
//!
//! ```text
//! POST /api/transfers                              create_transfer
//! GET  /api/transfers/{transaction_id}             get_transfer
//! GET  /api/accounts/{account_number}/transfers    get_account_transfers
//! GET  /api/health                                 health_check
//! GET  /api-docs/openapi.json                      OpenAPI document
//! ```

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Json, Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use utoipa::OpenApi;

pub use state::AppState;

/// Build the router over shared state
pub fn create_app(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/transfers", post(handlers::create_transfer))
        .route("/transfers/{transaction_id}", get(handlers::get_transfer))
        .route(
            "/accounts/{account_number}/transfers",
            get(handlers::get_account_transfers),
        )
        .route("/health", get(handlers::health_check));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        // stateless, added after with_state
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
}

/// Start HTTP Gateway server, returning after Ctrl-C
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_app(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {} (port in use?)", addr, e))?;

    tracing::info!(%addr, "Gateway listening");
    tracing::info!("API Docs: http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
