//! Post request and view types

use crate::validation::{Validate, ValidationErrors};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// New post sent by the admin area
#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Defaults to now
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub show_post_even_if_private: bool,
    pub allow_comments: Option<bool>,
    pub author_id: Option<String>,
}

impl Validate for PostInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("title", &self.title, 255);
        errors.required("body", &self.body, 100_000);

        if let Some(tag) = self.tags.iter().find(|t| t.trim().is_empty()) {
            errors.add("tags", format!("Tag '{}' is empty", tag));
        }

        errors.into_result()
    }
}

/// A post as shown to readers
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub publish_at: DateTime<Utc>,
    pub allow_comments: bool,
    pub comments_count: usize,
    pub comments: Vec<CommentView>,
}

/// A comment as shown to readers, without contact details
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: u32,
    pub author: String,
    pub url: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
