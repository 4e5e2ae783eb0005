//! Blog documents

use chrono::{DateTime, Utc};
use raccoon_store::Document;
use serde::{Deserialize, Serialize};

pub fn post_document_id(key: &str) -> String {
    format!("posts/{}", key)
}

pub fn comments_document_id(key: &str) -> String {
    format!("posts/{}/comments", key)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub publish_at: DateTime<Utc>,
    #[serde(default)]
    pub show_post_even_if_private: bool,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    pub comments_id: String,
    #[serde(default)]
    pub comments_count: usize,
}

fn default_true() -> bool {
    true
}

impl Post {
    /// Visible to readers right now
    pub fn is_public(&self, now: DateTime<Utc>) -> bool {
        !self.is_deleted && self.publish_at <= now
    }
}

impl Document for Post {
    const COLLECTION: Option<&'static str> = Some("Posts");

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Comment {
    pub id: u32,
    pub author: String,
    pub email: String,
    pub url: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub user_host_address: String,
    pub user_agent: String,
    #[serde(default)]
    pub is_spam: bool,
}

/// All comments of one post, kept in a single document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostComments {
    pub id: String,
    pub post_id: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub spam: Vec<Comment>,
    #[serde(default)]
    pub last_comment_id: u32,
}

impl PostComments {
    pub fn new(id: String, post_id: String) -> Self {
        Self {
            id,
            post_id,
            comments: Vec::new(),
            spam: Vec::new(),
            last_comment_id: 0,
        }
    }

    pub fn generate_id(&mut self) -> u32 {
        self.last_comment_id += 1;
        self.last_comment_id
    }

    /// Remove a comment from either list
    pub fn remove(&mut self, comment_id: u32) -> Option<Comment> {
        if let Some(pos) = self.comments.iter().position(|c| c.id == comment_id) {
            return Some(self.comments.remove(pos));
        }
        self.spam
            .iter()
            .position(|c| c.id == comment_id)
            .map(|pos| self.spam.remove(pos))
    }

    pub fn mark_spam(&mut self, comment_id: u32) -> bool {
        match self.remove(comment_id) {
            Some(mut comment) => {
                comment.is_spam = true;
                self.spam.push(comment);
                true
            }
            None => false,
        }
    }

    pub fn mark_ham(&mut self, comment_id: u32) -> bool {
        match self.remove(comment_id) {
            Some(mut comment) => {
                comment.is_spam = false;
                self.comments.push(comment);
                self.comments.sort_by_key(|c| c.id);
                true
            }
            None => false,
        }
    }
}

impl Document for PostComments {
    const COLLECTION: Option<&'static str> = Some("PostComments");

    fn id(&self) -> &str {
        &self.id
    }
}
