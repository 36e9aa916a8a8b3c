//! API routes definition.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{self, SharedState};

/// Create the API router with shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/status", get(handlers::status))
        // Terms
        .route("/terms/{id}", get(handlers::get_term))
        // Subgraphs
        .route("/subgraph", get(handlers::default_subgraph))
        .route("/subgraph/{id}", get(handlers::get_subgraph))
        .route("/subgraph/{id}/elements", get(handlers::get_elements))
        .route("/subgraphs", post(handlers::batch_subgraphs))
        .with_state(state)
}

/// Create router with CORS and logging middleware.
pub fn create_router_with_middleware(state: SharedState) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
