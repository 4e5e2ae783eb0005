//! Admin area handlers

use super::types::{ModerateCommentsRequest, ModerationResponse};
use crate::binders::CommentCommandOptions;
use crate::models::{post_document_id, Post, PostComments};
use crate::session::RequestContext;
use crate::validation::Validate;
use crate::{AppState, WebError, WebResult};
use axum::{
    extract::{Path, State},
    response::Json,
};
use raccoon_store::CapturedRequest;
use tracing::info;

/// Apply a moderation command to some comments of a post
///
/// Either every listed comment is moderated or none is: an unknown comment id
/// fails the request, which drops the session's writes.
pub async fn moderate_comments(
    context: RequestContext,
    Path(key): Path<String>,
    Json(request): Json<ModerateCommentsRequest>,
) -> WebResult<Json<ModerationResponse>> {
    request.validate()?;

    let mut scope = context.lock().await;
    let post_id = post_document_id(&key);
    let mut post = scope
        .session
        .load::<Post>(&post_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Post {} not found", key)))?;
    let mut comments = scope
        .session
        .load::<PostComments>(&post.comments_id)
        .await?
        .ok_or_else(|| WebError::NotFound(format!("Post {} has no comments", key)))?;

    let command = *request.command;
    let mut missing = Vec::new();
    for &id in &request.comment_ids {
        let applied = match command {
            CommentCommandOptions::Delete => comments.remove(id).is_some(),
            CommentCommandOptions::MarkSpam => comments.mark_spam(id),
            CommentCommandOptions::MarkHam => comments.mark_ham(id),
        };
        if !applied {
            missing.push(id);
        }
    }

    post.comments_count = comments.comments.len();
    scope.session.store(&comments)?;
    scope.session.store(&post)?;

    if !missing.is_empty() {
        return Err(WebError::NotFound(format!(
            "Comments {:?} not found on post {}",
            missing, key
        )));
    }

    info!(post = %post_id, ?command, count = request.comment_ids.len(), "Moderated comments");
    Ok(Json(ModerationResponse {
        command,
        affected: request.comment_ids.len(),
        comments_count: post.comments_count,
    }))
}

/// Store requests captured by the profiler, sensitive fields removed
pub async fn profiler_results(State(state): State<AppState>) -> WebResult<Json<Vec<CapturedRequest>>> {
    let profiler = state
        .profiler()
        .ok_or_else(|| WebError::NotFound("Profiler is disabled".to_string()))?;
    Ok(Json(profiler.results()))
}
