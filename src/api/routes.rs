use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalogue
        .route(
            "/catalogue",
            get(handlers::get_catalogue).put(handlers::replace_catalogue),
        )
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        // Onboarding
        .route("/sessions/:id/pair", get(handlers::next_pair))
        .route("/sessions/:id/votes", post(handlers::submit_vote))
        .route("/sessions/:id/skip", post(handlers::skip))
        .route("/sessions/:id/reset", post(handlers::reset))
        .route("/sessions/:id/exploration", post(handlers::adjust_exploration))
        // Item feedback
        .route("/sessions/:id/hide", post(handlers::hide))
        .route("/sessions/:id/unhide", post(handlers::unhide))
        .route("/sessions/:id/like", post(handlers::like))
        // Output
        .route("/sessions/:id/recommendations", get(handlers::recommendations))
}
