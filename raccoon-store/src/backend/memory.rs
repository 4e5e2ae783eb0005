//! In-memory backend

use super::StoreBackend;
use crate::document::{BatchCommand, StoredDocument};
use crate::error::StoreResult;
use crate::indexes::IndexDefinition;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory document storage
#[derive(Clone, Default)]
pub struct MemoryBackend {
    documents: Arc<RwLock<HashMap<String, StoredDocument>>>,
    indexes: Arc<RwLock<HashMap<String, IndexDefinition>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, id: &str) -> StoreResult<Option<StoredDocument>> {
        Ok(self.documents.read().await.get(id).cloned())
    }

    async fn batch(&self, commands: &[BatchCommand]) -> StoreResult<()> {
        let mut documents = self.documents.write().await;
        for command in commands {
            match command {
                BatchCommand::Put {
                    id,
                    body,
                    collection,
                } => {
                    documents.insert(
                        id.clone(),
                        StoredDocument {
                            id: id.clone(),
                            collection: collection.clone(),
                            body: body.clone(),
                        },
                    );
                }
                BatchCommand::Delete { id } => {
                    documents.remove(id);
                }
            }
        }
        debug!(commands = commands.len(), "Applied batch to memory storage");
        Ok(())
    }

    async fn put_index(&self, index: &IndexDefinition) -> StoreResult<()> {
        self.indexes
            .write()
            .await
            .insert(index.name.clone(), index.clone());
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // Memory storage is always healthy
        Ok(())
    }
}
