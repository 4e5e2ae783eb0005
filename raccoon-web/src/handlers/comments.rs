//! Reader comment handlers

use super::types::{AcceptedResponse, CommentInput};
use crate::mapping::RequestInfo;
use crate::models::{post_document_id, Post};
use crate::session::RequestContext;
use crate::tasks::AddCommentTask;
use crate::validation::Validate;
use crate::{WebError, WebResult};
use axum::{extract::Path, http::StatusCode, response::Json};
use chrono::Utc;
use tracing::debug;

/// Accept a comment; it is added to the post after the request commits
pub async fn add_comment(
    context: RequestContext,
    request: RequestInfo,
    Path(key): Path<String>,
    Json(input): Json<CommentInput>,
) -> WebResult<(StatusCode, Json<AcceptedResponse>)> {
    input.validate()?;

    let mut scope = context.lock().await;
    let post = scope
        .session
        .load::<Post>(&post_document_id(&key))
        .await?
        .filter(|post| post.is_public(Utc::now()))
        .ok_or_else(|| WebError::NotFound(format!("Post {} not found", key)))?;

    if !post.allow_comments {
        return Err(WebError::BadRequest("Comments are closed for this post".to_string()));
    }

    if !input.commenter_key.is_nil() {
        debug!(commenter = %input.commenter_key.0, "Returning commenter");
    }

    scope.execute_later(AddCommentTask {
        post_key: key,
        input,
        request,
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted".to_string(),
            message: "Your comment will show up shortly".to_string(),
        }),
    ))
}
