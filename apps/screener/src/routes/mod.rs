pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::keywords::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/keywords/registry", get(handlers::handle_get_registry))
        .route(
            "/api/v1/keywords/registry/:id",
            get(handlers::handle_get_keyword),
        )
        .route("/api/v1/keywords/scan", post(handlers::handle_scan))
        .route("/api/v1/keywords/enhance", post(handlers::handle_enhance))
        .route("/api/v1/keywords/validate", post(handlers::handle_validate))
        .route("/api/v1/screenings", post(handlers::handle_screening))
        .with_state(state)
}
