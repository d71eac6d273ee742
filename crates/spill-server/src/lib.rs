//! Token server library logic.
//!
//! Exposes the router so integration tests and the binary share one route
//! table.

pub mod api;
pub mod config;

use axum::{routing::get, Extension, Router};
use spill_voice::TokenIssuer;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Signs room-join tokens. Holds the LiveKit credentials.
    pub issuer: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            issuer: Arc::new(issuer),
        }
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::health_handler))
        .route(
            "/getToken",
            get(api::get_token_query_handler).post(api::get_token_body_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
