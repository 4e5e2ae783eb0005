//! Raccoon Blog web host
//!
//! Serves the blog over axum. Each request runs inside its own document
//! session; startup wires the store, indexes, profiler and background tasks.

pub mod binders;
pub mod handlers;
pub mod mapping;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod session;
pub mod startup;
pub mod state;
pub mod tasks;
pub mod validation;

// Re-export main types
pub use server::RaccoonServer;
pub use startup::{Bootstrapper, StartupError};
pub use state::{AppState, StoreAvailability};

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Json, Response},
    Router,
};
use raccoon_store::StoreError;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{debug, error};
use validation::ValidationErrors;

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    with_request_lifecycle(routes::all_routes(), state)
}

/// Wrap `routes` in the per-request session lifecycle and the global layers
///
/// Panics are turned into responses before the session middleware sees them,
/// so a panicking handler's writes are dropped like any other failure.
pub fn with_request_lifecycle(routes: Router<AppState>, state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    routes
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(from_fn_with_state(state.clone(), session::raven_session))
        .layer(from_fn_with_state(state.clone(), middleware::unreachable_redirect))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Marker attached to responses of requests that failed
///
/// The session middleware drops a request's writes when it finds this marker.
#[derive(Debug, Clone)]
pub struct UnhandledError {
    pub message: String,
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Startup error: {0}")]
    Startup(#[from] StartupError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            WebError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            WebError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            WebError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
            WebError::Store(e) if e.is_unreachable() => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unreachable")
            }
            WebError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            WebError::Server(_) | WebError::Startup(_) | WebError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error = code, "{}", message);
        } else {
            debug!(error = code, "{}", message);
        }

        let body = match &self {
            WebError::Validation(errors) => serde_json::json!({
                "error": code,
                "message": message,
                "fields": errors,
            }),
            _ => serde_json::json!({
                "error": code,
                "message": message,
            }),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(UnhandledError { message });
        response
    }
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;
