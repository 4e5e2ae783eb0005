//! Document types exchanged with the storage backends

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An entity that can be stored in the document store under a string id
pub trait Document: Serialize + DeserializeOwned {
    /// Collection the document belongs to, `None` for system documents
    const COLLECTION: Option<&'static str>;

    fn id(&self) -> &str;
}

/// A raw document as the backends see it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub collection: Option<String>,
    pub body: Value,
}

/// One write inside a `save_changes` batch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Method")]
pub enum BatchCommand {
    #[serde(rename = "PUT")]
    Put {
        #[serde(rename = "Key")]
        id: String,
        #[serde(rename = "Document")]
        body: Value,
        #[serde(rename = "Collection", skip_serializing_if = "Option::is_none")]
        collection: Option<String>,
    },
    #[serde(rename = "DELETE")]
    Delete {
        #[serde(rename = "Key")]
        id: String,
    },
}

impl BatchCommand {
    pub fn id(&self) -> &str {
        match self {
            BatchCommand::Put { id, .. } | BatchCommand::Delete { id } => id,
        }
    }
}
