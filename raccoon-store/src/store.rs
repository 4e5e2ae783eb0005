//! Process-wide document store handle

use crate::backend::{StoreBackend, StoreConnector};
use crate::connection::ConnectionString;
use crate::error::StoreResult;
use crate::indexes::IndexDefinition;
use crate::profiler::Profiler;
use crate::session::DocumentSession;
use std::sync::{Arc, OnceLock};
use tracing::info;

/// Shared, thread-safe entry point to the database
///
/// Created once per process and handed out behind an `Arc`. Everything but the
/// profiler slot is read-only after construction.
pub struct DocumentStore {
    backend: Arc<dyn StoreBackend>,
    connection: ConnectionString,
    profiler: OnceLock<Arc<Profiler>>,
}

impl DocumentStore {
    /// Connect to the database described by `connection`
    pub async fn initialize(
        connection: ConnectionString,
        connector: &dyn StoreConnector,
    ) -> StoreResult<Self> {
        let backend = connector.connect(&connection).await?;
        info!(backend = backend.name(), "Document store initialized ({})", connection.redacted());
        Ok(Self::with_backend(connection, backend))
    }

    pub fn with_backend(connection: ConnectionString, backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            connection,
            profiler: OnceLock::new(),
        }
    }

    pub fn open_session(self: &Arc<Self>) -> DocumentSession {
        DocumentSession::new(self.clone())
    }

    pub async fn execute_index(&self, index: &IndexDefinition) -> StoreResult<()> {
        self.backend.put_index(index).await
    }

    /// Attach a profiler; returns false when one is already attached
    pub fn attach_profiler(&self, profiler: Arc<Profiler>) -> bool {
        self.profiler.set(profiler).is_ok()
    }

    pub fn profiler(&self) -> Option<&Arc<Profiler>> {
        self.profiler.get()
    }

    pub async fn health_check(&self) -> StoreResult<()> {
        self.backend.health_check().await
    }

    pub fn connection(&self) -> &ConnectionString {
        &self.connection
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub(crate) fn backend(&self) -> &dyn StoreBackend {
        self.backend.as_ref()
    }
}
