use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, propagate_request_id};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Recommendations
        .route("/api/recommendations", post(handlers::recommend))
        .route(
            "/api/recommendations/multi",
            post(handlers::recommend_multi),
        )
        // Preference signals
        .route(
            "/api/likes",
            post(handlers::add_like).delete(handlers::remove_like),
        )
        .route(
            "/api/dislikes",
            post(handlers::add_dislike).delete(handlers::remove_dislike),
        )
        .route("/api/preferences/:user_id", get(handlers::get_preferences))
        // Catalog browsing
        .route("/api/trending", get(handlers::trending))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum_middleware::from_fn(propagate_request_id))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
