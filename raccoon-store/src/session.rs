//! Unit of work over the document store
//!
//! A session tracks the documents it loaded and the writes it accumulated.
//! Nothing reaches the store until [`DocumentSession::save_changes`] sends the
//! pending writes as one batch.

use crate::document::{BatchCommand, Document};
use crate::error::{StoreError, StoreResult};
use crate::profiler::ProfiledOperation;
use crate::store::DocumentStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct DocumentSession {
    id: Uuid,
    store: Arc<DocumentStore>,
    // Identity map: id -> body as last seen by this session, None for a miss
    loaded: HashMap<String, Option<Value>>,
    pending: Vec<BatchCommand>,
}

impl DocumentSession {
    pub(crate) fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
            loaded: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document_store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Load a document, seeing this session's own pending writes first
    pub async fn load<T: Document>(&mut self, id: &str) -> StoreResult<Option<T>> {
        let body = match self.pending_body(id) {
            Some(body) => body,
            None => self.load_body(id).await?,
        };

        body.map(|body| {
            serde_json::from_value(body).map_err(|source| StoreError::Deserialize {
                id: id.to_string(),
                source,
            })
        })
        .transpose()
    }

    /// Queue a write of `document` under its own id
    pub fn store<T: Document>(&mut self, document: &T) -> StoreResult<()> {
        let id = document.id().to_string();
        if id.is_empty() {
            return Err(StoreError::Database {
                message: "Cannot store a document without an id".to_string(),
                source: None,
            });
        }

        let body = serde_json::to_value(document)?;
        self.queue(BatchCommand::Put {
            id,
            body,
            collection: T::COLLECTION.map(str::to_string),
        });
        Ok(())
    }

    pub fn delete(&mut self, id: &str) {
        self.queue(BatchCommand::Delete { id: id.to_string() });
    }

    pub fn has_changes(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Send every pending write in one batch
    ///
    /// Returns the number of commands sent. With nothing pending the store is
    /// not contacted at all. On failure the writes stay pending.
    pub async fn save_changes(&mut self) -> StoreResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let commands = std::mem::take(&mut self.pending);
        let started = Instant::now();
        if let Err(e) = self.store.backend().batch(&commands).await {
            warn!(session = %self.id, "Failed to save {} changes: {}", commands.len(), e);
            self.pending = commands;
            return Err(e);
        }

        if let Some(profiler) = self.store.profiler() {
            let bodies: Vec<Value> = commands
                .iter()
                .filter_map(|command| match command {
                    BatchCommand::Put { body, .. } => Some(body.clone()),
                    BatchCommand::Delete { .. } => None,
                })
                .collect();
            profiler.capture(
                self.id,
                ProfiledOperation::SaveChanges,
                commands.iter().map(|c| c.id().to_string()).collect(),
                started.elapsed(),
                Some(&Value::Array(bodies)),
            );
        }

        for command in &commands {
            let body = match command {
                BatchCommand::Put { body, .. } => Some(body.clone()),
                BatchCommand::Delete { .. } => None,
            };
            self.loaded.insert(command.id().to_string(), body);
        }

        debug!(session = %self.id, commands = commands.len(), "Saved changes");
        Ok(commands.len())
    }

    /// Drop every pending write, returning how many were dropped
    pub fn discard_changes(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        discarded
    }

    fn queue(&mut self, command: BatchCommand) {
        match self.pending.iter_mut().find(|c| c.id() == command.id()) {
            Some(existing) => *existing = command,
            None => self.pending.push(command),
        }
    }

    // Some(None) when the session itself deleted the document
    fn pending_body(&self, id: &str) -> Option<Option<Value>> {
        self.pending.iter().find(|c| c.id() == id).map(|command| match command {
            BatchCommand::Put { body, .. } => Some(body.clone()),
            BatchCommand::Delete { .. } => None,
        })
    }

    async fn load_body(&mut self, id: &str) -> StoreResult<Option<Value>> {
        if let Some(body) = self.loaded.get(id) {
            return Ok(body.clone());
        }

        let started = Instant::now();
        let document = self.store.backend().load(id).await?;
        let body = document.map(|d| d.body);

        if let Some(profiler) = self.store.profiler() {
            profiler.capture(
                self.id,
                ProfiledOperation::Load,
                vec![id.to_string()],
                started.elapsed(),
                body.as_ref(),
            );
        }

        self.loaded.insert(id.to_string(), body.clone());
        Ok(body)
    }
}
