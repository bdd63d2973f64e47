//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, the body-size limit,
//! and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use snapvault_core::config::ServerConfig;
use snapvault_core::error::SnapvaultError;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Captures are posted from pages served elsewhere, so any origin may call in.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let body_limit = state.config.ingest.max_body_bytes;

    Router::new()
        .route(
            "/captures",
            get(handlers::list_captures)
                .post(handlers::ingest)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .route("/captures/stream", get(handlers::stream))
        .route("/gallery", get(handlers::gallery))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind to the configured address and serve until the listener fails.
pub async fn start_server(server: &ServerConfig, state: AppState) -> Result<(), SnapvaultError> {
    let addr = format!("{}:{}", server.host, server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SnapvaultError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!(addr = %addr, "API server listening");
    tracing::info!("Gallery at http://{}/gallery", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| SnapvaultError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
