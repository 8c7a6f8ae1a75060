use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::session_id::{make_span_with_session_id, session_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(session_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_session_id))
                // The browser UI is served from another origin
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/catalog", get(handlers::browse_catalog))
        .route("/catalog/search", get(handlers::search_catalog))
        .route("/catalog/:id", get(handlers::get_entry))
        .route("/catalog/:id/like", post(handlers::toggle_like))
        .route("/catalog/:id/comments", post(handlers::add_comment))
        .route("/chat", post(handlers::chat))
}
