//! Request-scoped document sessions
//!
//! Every request gets its own [`DocumentSession`] through a [`RequestContext`]
//! stored in the request extensions. When the handler is done the session is
//! committed, or its writes are dropped if the response carries an
//! [`UnhandledError`]. Tasks the request queued are handed to the executor
//! only after a successful commit.

use crate::{AppState, UnhandledError, WebError};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use raccoon_store::{BackgroundTask, BoxedTask, DocumentSession, DocumentStore};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

/// What one request owns: its session and the tasks to run after it
pub struct RequestScope {
    pub session: DocumentSession,
    tasks: Vec<BoxedTask>,
}

impl RequestScope {
    /// Queue a task to run once this request has committed
    pub fn execute_later<T: BackgroundTask + 'static>(&mut self, task: T) {
        self.tasks.push(Box::new(task));
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }
}

/// Handle to the current request's scope
///
/// Cloned into the request extensions so handlers can reach it; it is never
/// shared with another request.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Mutex<RequestScope>>,
}

impl RequestContext {
    pub fn open(store: &Arc<DocumentStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RequestScope {
                session: store.open_session(),
                tasks: Vec::new(),
            })),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, RequestScope> {
        self.inner.lock().await
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = WebError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| WebError::Internal("No document session for this request".to_string()))
    }
}

/// Open a session for the request and close it once the response is ready
pub async fn raven_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let context = RequestContext::open(&state.store);
    request.extensions_mut().insert(context.clone());

    let response = next.run(request).await;
    end_request(&state, Some(context), response).await
}

/// Commit or discard the request's session, then kick its background tasks
pub async fn end_request(
    state: &AppState,
    context: Option<RequestContext>,
    response: Response,
) -> Response {
    let Some(context) = context else {
        return response;
    };

    let tasks = {
        let mut scope = context.lock().await;

        if response.extensions().get::<UnhandledError>().is_some() {
            scope.session.discard_changes();
            scope.tasks.clear();
            return response;
        }

        match scope.session.save_changes().await {
            Ok(0) => {}
            Ok(saved) => debug!(session = %scope.session.id(), saved, "Committed request session"),
            Err(e) => {
                error!(session = %scope.session.id(), "Failed to commit request session: {}", e);
                scope.session.discard_changes();
                scope.tasks.clear();
                return WebError::Store(e).into_response();
            }
        }

        std::mem::take(&mut scope.tasks)
    };
    drop(context);

    state.tasks.start_executing(tasks);
    response
}
