pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::convert::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Conversion API
        .route(
            "/api/v1/convert/text",
            post(handlers::handle_convert_text),
        )
        .route(
            "/api/v1/convert/images",
            post(handlers::handle_convert_images),
        )
        .route("/api/v1/merge", post(handlers::handle_merge))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
