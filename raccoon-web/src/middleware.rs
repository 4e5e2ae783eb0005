//! Raccoon Blog middleware

use crate::mapping::RequestInfo;
use crate::startup::NOT_REACHABLE_PAGE;
use crate::{AppState, WebError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::any::Any;
use std::convert::Infallible;
use tracing::error;

/// Send every request to the not-reachable page while the database is down
pub async fn unreachable_redirect(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.availability.is_available() || request.uri().path() == NOT_REACHABLE_PAGE {
        return next.run(request).await;
    }

    (StatusCode::FOUND, [(header::LOCATION, NOT_REACHABLE_PAGE)]).into_response()
}

/// Turn a handler panic into a 500 that the session middleware treats as a failed request
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!("Request handler panicked: {}", message);
    WebError::Internal(message).into_response()
}

/// Client address, honoring proxy headers
pub fn client_address(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
        return real_ip.trim().to_string();
    }

    "unknown".to_string()
}

impl<S> FromRequestParts<S> for RequestInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(RequestInfo {
            user_host_address: client_address(&parts.headers),
            user_agent,
        })
    }
}
