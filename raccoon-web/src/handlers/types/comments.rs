//! Comment request types

use crate::binders::{CommentCommandOptions, PermissiveUuid, RemoveSpacesEnum};
use crate::validation::{Validate, ValidationErrors};
use serde::{Deserialize, Serialize};

/// Comment posted by a reader
#[derive(Debug, Clone, Deserialize)]
pub struct CommentInput {
    pub author: String,
    pub email: String,
    pub url: Option<String>,
    pub body: String,
    /// Cookie-held key that identifies returning commenters
    #[serde(default)]
    pub commenter_key: PermissiveUuid,
}

impl Validate for CommentInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.required("author", &self.author, 100);
        errors.email("email", &self.email);
        errors.optional_url("url", self.url.as_deref());
        errors.required("body", &self.body, 10_000);
        errors.into_result()
    }
}

/// Moderation command from the admin comments page
#[derive(Debug, Clone, Deserialize)]
pub struct ModerateCommentsRequest {
    pub command: RemoveSpacesEnum<CommentCommandOptions>,
    pub comment_ids: Vec<u32>,
}

impl Validate for ModerateCommentsRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.comment_ids.is_empty() {
            errors.add("comment_ids", "At least one comment is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationResponse {
    pub command: CommentCommandOptions,
    pub affected: usize,
    pub comments_count: usize,
}
