//! Index definitions and index creation

use crate::error::{StoreError, StoreResult};
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A simple map index over top-level fields of one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub collection: String,
    pub fields: Vec<String>,
}

impl IndexDefinition {
    pub fn new(name: &str, collection: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            collection: collection.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Names and fields end up in SQL and LINQ text, so only plain identifiers are accepted
    pub fn validate(&self) -> StoreResult<()> {
        let invalid = |message: &str| StoreError::InvalidIndex {
            index: self.name.clone(),
            message: message.to_string(),
        };

        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '_')
        {
            return Err(invalid("name may only contain letters, digits, '/' and '_'"));
        }

        if !is_identifier(&self.collection) {
            return Err(invalid("collection must be a plain identifier"));
        }

        if self.fields.is_empty() {
            return Err(invalid("at least one field is required"));
        }

        if let Some(field) = self.fields.iter().find(|f| !is_identifier(f)) {
            return Err(invalid(&format!("field '{}' must be a plain identifier", field)));
        }

        Ok(())
    }

    /// LINQ map as understood by the document server
    pub fn map(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|f| format!("doc.{}", f))
            .collect::<Vec<_>>()
            .join(", ");
        format!("from doc in docs.{} select new {{ {} }}", self.collection, fields)
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Create every index against the store, stopping at the first failure
pub async fn create_indexes(store: &DocumentStore, indexes: &[IndexDefinition]) -> StoreResult<()> {
    for index in indexes {
        index.validate()?;
        debug!(index = %index.name, collection = %index.collection, "Creating index");
        store.execute_index(index).await?;
    }

    info!(count = indexes.len(), "Indexes created");
    Ok(())
}
