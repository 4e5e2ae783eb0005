//! Background tasks queued by request handlers

use crate::handlers::types::CommentInput;
use crate::mapping::RequestInfo;
use crate::models::{comments_document_id, post_document_id, Post, PostComments};
use async_trait::async_trait;
use chrono::Utc;
use raccoon_store::{BackgroundTask, DocumentSession, StoreError, StoreResult};
use tracing::{debug, info};

/// Append a reader's comment to a post
pub struct AddCommentTask {
    pub post_key: String,
    pub input: CommentInput,
    pub request: RequestInfo,
}

#[async_trait]
impl BackgroundTask for AddCommentTask {
    fn name(&self) -> &str {
        "add-comment"
    }

    async fn execute(&self, session: &mut DocumentSession) -> StoreResult<()> {
        let post_id = post_document_id(&self.post_key);
        let Some(mut post) = session.load::<Post>(&post_id).await? else {
            // The post went away between the request and now
            debug!(post = %post_id, "Dropping comment for missing post");
            return Ok(());
        };

        let comments_id = comments_document_id(&self.post_key);
        let mut comments = session
            .load::<PostComments>(&comments_id)
            .await?
            .unwrap_or_else(|| PostComments::new(comments_id.clone(), post_id.clone()));

        if comments.post_id != post_id {
            return Err(StoreError::Database {
                message: format!("{} belongs to {}, not {}", comments_id, comments.post_id, post_id),
                source: None,
            });
        }

        let id = comments.generate_id();
        let comment = self.input.clone().into_comment(id, &self.request, Utc::now());
        comments.comments.push(comment);

        post.comments_count = comments.comments.len();
        session.store(&comments)?;
        session.store(&post)?;

        info!(post = %post_id, comment = id, "Comment added");
        Ok(())
    }
}
