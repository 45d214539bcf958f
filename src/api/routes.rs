//! REST API routes configuration

use crate::api::handlers::{self, ApiState};
use crate::api::websocket::ws_handler;
use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};

/// JSON 404 for unknown routes
async fn fallback_handler(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(handlers::ApiError {
            error: format!("Not Found: {}", uri.path()),
        }),
    )
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    // Configure CORS for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // WebSocket for real-time updates
        .route("/ws", get(ws_handler))
        // Vault
        .route("/api/vault", get(handlers::get_vault_info))
        .route("/api/vault/owners", get(handlers::get_owners))
        .route("/api/vault/transactions", get(handlers::list_transactions))
        .route(
            "/api/vault/transactions/{index}",
            get(handlers::get_transaction),
        )
        .route(
            "/api/vault/transactions/{index}/confirmations",
            get(handlers::get_confirmations),
        )
        .route("/api/vault/nonce/{address}", get(handlers::get_nonce))
        .route("/api/vault/events", get(handlers::get_events))
        .route("/api/vault/requests", post(handlers::submit_request))
        // Tokens
        .route("/api/tokens", get(handlers::list_tokens))
        .route("/api/tokens/{address}", get(handlers::get_token))
        .route(
            "/api/tokens/{address}/balance/{holder}",
            get(handlers::get_token_balance),
        )
        .fallback(fallback_handler)
        // Add state and middleware
        .with_state(state)
        .layer(cors)
}
