//! Mapping between stored documents, request inputs and view models

use crate::handlers::types::{CommentInput, CommentView, PostInput, PostView};
use crate::models::{comments_document_id, post_document_id, Comment, Post, PostComments};
use chrono::{DateTime, Utc};

/// Where a request came from, recorded on comments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub user_host_address: String,
    pub user_agent: String,
}

impl From<&Comment> for CommentView {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            author: comment.author.clone(),
            url: comment.url.clone(),
            body: comment.body.clone(),
            created_at: comment.created_at,
        }
    }
}

/// A post together with its comments document, if it has one yet
pub struct PostWithComments<'a> {
    pub post: &'a Post,
    pub comments: Option<&'a PostComments>,
}

impl From<PostWithComments<'_>> for PostView {
    fn from(source: PostWithComments<'_>) -> Self {
        let post = source.post;
        let comments: Vec<CommentView> = source
            .comments
            .map(|c| c.comments.iter().map(CommentView::from).collect())
            .unwrap_or_default();

        Self {
            id: post.id.trim_start_matches("posts/").to_string(),
            title: post.title.clone(),
            body: post.body.clone(),
            tags: post.tags.clone(),
            publish_at: post.publish_at,
            allow_comments: post.allow_comments,
            comments_count: comments.len(),
            comments,
        }
    }
}

impl PostInput {
    pub fn into_post(self, key: &str, now: DateTime<Utc>) -> Post {
        Post {
            id: post_document_id(key),
            title: self.title.trim().to_string(),
            body: self.body,
            tags: self.tags.into_iter().map(|t| t.trim().to_lowercase()).collect(),
            author_id: self.author_id,
            created_at: now,
            publish_at: self.publish_at.unwrap_or(now),
            show_post_even_if_private: self.show_post_even_if_private,
            is_deleted: false,
            allow_comments: self.allow_comments.unwrap_or(true),
            comments_id: comments_document_id(key),
            comments_count: 0,
        }
    }
}

impl CommentInput {
    pub fn into_comment(self, id: u32, request: &RequestInfo, now: DateTime<Utc>) -> Comment {
        Comment {
            id,
            author: self.author.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            url: self.url.filter(|u| !u.trim().is_empty()),
            body: self.body,
            created_at: now,
            user_host_address: request.user_host_address.clone(),
            user_agent: request.user_agent.clone(),
            is_spam: false,
        }
    }
}

/// Mappings the handlers rely on, for the startup log
pub fn registered_mappings() -> [&'static str; 4] {
    [
        "Comment -> CommentView",
        "Post + PostComments -> PostView",
        "PostInput -> Post",
        "CommentInput -> Comment",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binders::PermissiveUuid;

    fn request() -> RequestInfo {
        RequestInfo {
            user_host_address: "10.0.0.1".to_string(),
            user_agent: "curl".to_string(),
        }
    }

    #[test]
    fn test_comment_view_hides_contact_details() {
        let input = CommentInput {
            author: " Reader ".to_string(),
            email: "Reader@Example.com".to_string(),
            url: Some(String::new()),
            body: "Thanks".to_string(),
            commenter_key: PermissiveUuid::default(),
        };
        let comment = input.into_comment(7, &request(), Utc::now());
        assert_eq!(comment.author, "Reader");
        assert_eq!(comment.email, "reader@example.com");
        assert!(comment.url.is_none());

        let view = serde_json::to_value(CommentView::from(&comment)).unwrap();
        assert_eq!(view["id"], 7);
        assert!(view.get("email").is_none());
        assert!(view.get("user_host_address").is_none());
    }

    #[test]
    fn test_post_view_only_shows_approved_comments() {
        let now = Utc::now();
        let post = PostInput {
            title: "Hello".to_string(),
            body: "World".to_string(),
            tags: vec![" Rust ".to_string()],
            publish_at: None,
            show_post_even_if_private: false,
            allow_comments: None,
            author_id: None,
        }
        .into_post("1", now);
        assert_eq!(post.tags, vec!["rust"]);
        assert_eq!(post.publish_at, now);

        let mut comments = PostComments::new(post.comments_id.clone(), post.id.clone());
        comments.comments.push(Comment {
            id: 1,
            author: "a".to_string(),
            email: "a@example.com".to_string(),
            url: None,
            body: "ok".to_string(),
            created_at: now,
            user_host_address: "::1".to_string(),
            user_agent: "x".to_string(),
            is_spam: false,
        });
        let mut spam = comments.comments[0].clone();
        spam.id = 2;
        comments.spam.push(spam);

        let view = PostView::from(PostWithComments {
            post: &post,
            comments: Some(&comments),
        });
        assert_eq!(view.id, "1");
        assert_eq!(view.comments_count, 1);
        assert!(view.allow_comments);
    }
}
