pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::evaluation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Artifacts (including the rewritten résumé) are served straight from
    // the output directory, the same path shape the client already fetches.
    let output_dir = state.config.output_dir.clone();

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/analyze", post(handlers::handle_analyze))
        .nest_service("/output", ServeDir::new(output_dir))
        .with_state(state)
}
