//! Document store client for Raccoon Blog
//!
//! Provides the process-wide [`DocumentStore`], per-request [`DocumentSession`]s,
//! index creation, the redacting [`Profiler`] and the background [`TaskExecutor`].

pub mod backend;
pub mod connection;
pub mod document;
pub mod error;
pub mod indexes;
pub mod profiler;
pub mod session;
pub mod store;
pub mod tasks;
pub mod versioning;

pub use backend::{DefaultConnector, MemoryBackend, StoreBackend, StoreConnector};
pub use connection::ConnectionString;
pub use document::{BatchCommand, Document, StoredDocument};
pub use error::{StoreError, StoreResult, TransportErrorKind};
pub use indexes::{create_indexes, IndexDefinition};
pub use profiler::{CapturedRequest, ProfiledOperation, Profiler};
pub use session::DocumentSession;
pub use store::DocumentStore;
pub use tasks::{BackgroundTask, BoxedTask, TaskExecutor, TaskOutcome};
pub use versioning::{seed_default_configuration, VersioningConfiguration, VERSIONING_CONFIGURATION_ID};
