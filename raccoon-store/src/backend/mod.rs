//! Storage backends
//!
//! The document store talks to one backend picked from the connection string:
//! a document server over HTTP, an embedded SQLite file, or process memory.

pub mod http;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use http::HttpBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

use crate::connection::ConnectionString;
use crate::document::{BatchCommand, StoredDocument};
use crate::error::StoreResult;
use crate::indexes::IndexDefinition;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Storage backend trait for the different persistence targets
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Short name used in logs and health output
    fn name(&self) -> &'static str;

    /// Load a document by id
    async fn load(&self, id: &str) -> StoreResult<Option<StoredDocument>>;

    /// Apply a batch of writes atomically
    async fn batch(&self, commands: &[BatchCommand]) -> StoreResult<()>;

    /// Create or replace an index
    async fn put_index(&self, index: &IndexDefinition) -> StoreResult<()>;

    /// Health check for the storage backend
    async fn health_check(&self) -> StoreResult<()>;
}

/// Turns a connection string into a live backend
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, connection: &ConnectionString) -> StoreResult<Arc<dyn StoreBackend>>;
}

/// Connector used outside of tests
#[derive(Debug, Clone)]
pub struct DefaultConnector {
    pub request_timeout: Duration,
}

impl Default for DefaultConnector {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl StoreConnector for DefaultConnector {
    async fn connect(&self, connection: &ConnectionString) -> StoreResult<Arc<dyn StoreBackend>> {
        match connection {
            ConnectionString::Server { url, database } => Ok(Arc::new(HttpBackend::new(
                url.clone(),
                database.clone(),
                self.request_timeout,
            )?)),
            #[cfg(feature = "sqlite")]
            ConnectionString::Embedded { data_dir } => {
                Ok(Arc::new(SqliteBackend::open(data_dir, self.request_timeout).await?))
            }
            #[cfg(not(feature = "sqlite"))]
            ConnectionString::Embedded { .. } => Err(crate::error::StoreError::InvalidConnectionString {
                message: "DataDir requires the sqlite feature".to_string(),
            }),
            ConnectionString::InMemory => Ok(Arc::new(MemoryBackend::new())),
        }
    }
}
