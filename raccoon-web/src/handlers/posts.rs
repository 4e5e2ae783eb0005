//! Post handlers

use super::types::{CreatedResponse, PostInput, PostView};
use crate::mapping::PostWithComments;
use crate::models::{post_document_id, Post, PostComments};
use crate::session::RequestContext;
use crate::validation::Validate;
use crate::{WebError, WebResult};
use axum::{extract::Path, http::StatusCode, response::Json};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// Show a published post with its approved comments
pub async fn get_post(
    context: RequestContext,
    Path(key): Path<String>,
) -> WebResult<Json<PostView>> {
    let mut scope = context.lock().await;

    let post = scope
        .session
        .load::<Post>(&post_document_id(&key))
        .await?
        .filter(|post| post.is_public(Utc::now()))
        .ok_or_else(|| WebError::NotFound(format!("Post {} not found", key)))?;
    let comments = scope.session.load::<PostComments>(&post.comments_id).await?;

    Ok(Json(PostView::from(PostWithComments {
        post: &post,
        comments: comments.as_ref(),
    })))
}

/// Create a post and its empty comments document
pub async fn create_post(
    context: RequestContext,
    Json(input): Json<PostInput>,
) -> WebResult<(StatusCode, Json<CreatedResponse>)> {
    input.validate()?;

    let key = Uuid::new_v4().simple().to_string();
    let post = input.into_post(&key, Utc::now());
    let comments = PostComments::new(post.comments_id.clone(), post.id.clone());

    let mut scope = context.lock().await;
    scope.session.store(&post)?;
    scope.session.store(&comments)?;

    info!(post = %post.id, "Created post '{}'", post.title);
    Ok((StatusCode::CREATED, Json(CreatedResponse { id: key })))
}
