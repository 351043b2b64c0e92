use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, state::AppState};

/// All API routes, without process-level layers (CORS, metrics, tracing).
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api", get(handlers::api_index))
        // Auth routes
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        // Bookmark routes (protected)
        .route(
            "/api/bookmarks",
            post(handlers::bookmarks::create_bookmark).get(handlers::bookmarks::list_bookmarks),
        )
        .route("/api/bookmarks/tags", get(handlers::bookmarks::list_tags))
        .route(
            "/api/bookmarks/:id",
            put(handlers::bookmarks::update_bookmark).delete(handlers::bookmarks::delete_bookmark),
        )
        .with_state(state)
}
