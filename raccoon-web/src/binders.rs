//! Lenient request value binders
//!
//! Form posts from the admin pages send enum values as display text
//! ("Mark Spam") and commenter keys in whatever shape the browser kept them.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use uuid::Uuid;

/// An enum value parsed after stripping every space from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveSpacesEnum<T>(pub T);

impl<T: FromStr> FromStr for RemoveSpacesEnum<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        compact.parse().map(RemoveSpacesEnum)
    }
}

impl<'de, T> Deserialize<'de> for RemoveSpacesEnum<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl<T> Deref for RemoveSpacesEnum<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// An identifier that never fails to bind: anything unparseable becomes the nil id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct PermissiveUuid(pub Uuid);

impl PermissiveUuid {
    pub fn parse(raw: &str) -> Self {
        PermissiveUuid(Uuid::parse_str(raw.trim()).unwrap_or_else(|_| Uuid::nil()))
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl<'de> Deserialize<'de> for PermissiveUuid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(PermissiveUuid::parse).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommentCommandOptions {
    Delete,
    MarkSpam,
    MarkHam,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown comment command '{0}'")]
pub struct UnknownCommand(String);

impl FromStr for CommentCommandOptions {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Delete" => Ok(CommentCommandOptions::Delete),
            "MarkSpam" => Ok(CommentCommandOptions::MarkSpam),
            "MarkHam" => Ok(CommentCommandOptions::MarkHam),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Binders the request types rely on, for the startup log
pub fn registered_binders() -> [&'static str; 2] {
    [
        "RemoveSpacesEnum<CommentCommandOptions>",
        "PermissiveUuid",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spaces_are_removed_before_parsing() {
        let parsed: RemoveSpacesEnum<CommentCommandOptions> = " Mark Spam ".parse().unwrap();
        assert_eq!(*parsed, CommentCommandOptions::MarkSpam);

        let parsed: RemoveSpacesEnum<CommentCommandOptions> =
            serde_json::from_value(json!("Mark Ham")).unwrap();
        assert_eq!(parsed.0, CommentCommandOptions::MarkHam);

        assert!("mark spam".parse::<RemoveSpacesEnum<CommentCommandOptions>>().is_err());
        assert!(serde_json::from_value::<RemoveSpacesEnum<CommentCommandOptions>>(json!("Approve")).is_err());
    }

    #[test]
    fn test_uuid_binding_is_permissive() {
        let id = Uuid::new_v4();

        assert_eq!(PermissiveUuid::parse(&format!("  {}  ", id)).0, id);
        assert_eq!(PermissiveUuid::parse(&id.simple().to_string()).0, id);
        assert_eq!(PermissiveUuid::parse(&format!("{{{}}}", id)).0, id);
        assert!(PermissiveUuid::parse("not-a-guid").is_nil());
        assert!(PermissiveUuid::parse("").is_nil());

        let missing: PermissiveUuid = serde_json::from_value(json!(null)).unwrap();
        assert!(missing.is_nil());
        let bound: PermissiveUuid = serde_json::from_value(json!(id.to_string())).unwrap();
        assert_eq!(bound.0, id);
    }
}
