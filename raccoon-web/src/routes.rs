//! Route definitions for the blog

use crate::startup::NOT_REACHABLE_PAGE;
use crate::{handlers, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health_check))
}

/// Public blog routes
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}", get(handlers::get_post))
        .route("/posts/{id}/comments", post(handlers::add_comment))
}

/// Admin area routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(handlers::create_post))
        .route("/posts/{id}/comments", post(handlers::moderate_comments))
        .route("/profiler", get(handlers::profiler_results))
}

/// Static pages
pub fn static_routes() -> Router<AppState> {
    Router::new().route(NOT_REACHABLE_PAGE, get(handlers::not_reachable_page))
}

/// Create all routes combined
pub fn all_routes() -> Router<AppState> {
    Router::new()
        .nest("/api", api_routes())
        .nest("/admin", admin_routes())
        .merge(blog_routes())
        .merge(static_routes())
}
