pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::jobs::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs/search", post(handlers::handle_search))
        .route("/api/v1/jobs/scrape", post(handlers::handle_scrape))
        .route("/api/v1/jobs/extract", post(handlers::handle_extract))
        .route("/api/v1/jobs/cache", delete(handlers::handle_invalidate_cache))
        .route("/api/v1/jobs/cache/stats", get(handlers::handle_cache_stats))
        .route(
            "/api/v1/jobs/cache/stats/reset",
            post(handlers::handle_reset_cache_stats),
        )
        .with_state(state)
}
