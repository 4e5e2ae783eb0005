//! One-time application startup
//!
//! Connects the document store, creates the indexes, attaches the profiler,
//! starts the background task executor and seeds the versioning configuration.
//! A [`Bootstrapper`] runs each of these at most once; calling
//! [`Bootstrapper::start`] again hands back the same store.

use crate::state::{AppState, StoreAvailability};
use crate::{binders, mapping};
use raccoon_core::{RaccoonConfig, RaccoonError};
use raccoon_store::{
    create_indexes, seed_default_configuration, ConnectionString, DefaultConnector, DocumentStore,
    IndexDefinition, Profiler, StoreConnector, StoreError, TaskExecutor, TransportErrorKind,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Static page every request is sent to while the database cannot be reached
pub const NOT_REACHABLE_PAGE: &str = "/RavenNotReachable.htm";

/// Document fields the profiler never shows
pub const REDACTED_FIELDS: [&str; 7] = [
    "Email",
    "HashedPassword",
    "AkismetKey",
    "GoogleAnalyticsKey",
    "ShowPostEvenIfPrivate",
    "PasswordSalt",
    "UserHostAddress",
];

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] RaccoonError),

    #[error("Invalid connection string '{name}': {source}")]
    ConnectionString {
        name: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to initialize document store: {0}")]
    Store(#[source] StoreError),

    #[error("Database not reachable while creating indexes ({kind})")]
    TransportUnreachable { kind: TransportErrorKind },

    #[error("Failed to create indexes: {0}")]
    Indexes(#[source] StoreError),

    #[error("Failed to seed versioning configuration: {0}")]
    Seed(#[source] StoreError),
}

/// Indexes the blog queries against
pub fn blog_indexes() -> Vec<IndexDefinition> {
    vec![
        IndexDefinition::new("Posts/ByPublishAt", "Posts", &["PublishAt", "IsDeleted"]),
        IndexDefinition::new("PostComments/ByPostId", "PostComments", &["PostId"]),
        IndexDefinition::new("Users/ByEmail", "Users", &["Email"]),
        IndexDefinition::new("Tags/Count", "Posts", &["Tags"]),
    ]
}

/// Create the indexes, telling an unreachable database apart from every other failure
pub async fn try_creating_indexes(
    store: &DocumentStore,
    indexes: &[IndexDefinition],
) -> Result<(), StartupError> {
    match create_indexes(store, indexes).await {
        Ok(()) => Ok(()),
        Err(StoreError::Transport { kind, .. }) if kind.is_unreachable() => {
            Err(StartupError::TransportUnreachable { kind })
        }
        Err(e) => Err(StartupError::Indexes(e)),
    }
}

pub struct Bootstrapper {
    config: Arc<RaccoonConfig>,
    connector: Arc<dyn StoreConnector>,
    store: OnceCell<Arc<DocumentStore>>,
    availability: OnceCell<StoreAvailability>,
    tasks: OnceCell<Arc<TaskExecutor>>,
}

impl Bootstrapper {
    pub fn new(config: RaccoonConfig) -> Self {
        let connector = DefaultConnector {
            request_timeout: Duration::from_secs(config.store.request_timeout_secs),
        };
        Self::with_connector(config, Arc::new(connector))
    }

    pub fn with_connector(config: RaccoonConfig, connector: Arc<dyn StoreConnector>) -> Self {
        Self {
            config: Arc::new(config),
            connector,
            store: OnceCell::new(),
            availability: OnceCell::new(),
            tasks: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Arc<RaccoonConfig> {
        &self.config
    }

    pub fn store(&self) -> Option<&Arc<DocumentStore>> {
        self.store.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.store.initialized() && self.availability.initialized()
    }

    /// Run startup and build the application state
    ///
    /// Returns `Ok` with [`StoreAvailability::Unreachable`] when index creation
    /// could not reach the database; the application then only serves the
    /// not-reachable page.
    pub async fn start(&self) -> Result<AppState, StartupError> {
        let store = self
            .store
            .get_or_try_init(|| self.initialize_store())
            .await?
            .clone();

        let availability = *self
            .availability
            .get_or_try_init(|| async {
                match try_creating_indexes(&store, &blog_indexes()).await {
                    Ok(()) => Ok(StoreAvailability::Available),
                    Err(StartupError::TransportUnreachable { kind }) => {
                        warn!("Database not reachable ({}), serving {}", kind, NOT_REACHABLE_PAGE);
                        Ok(StoreAvailability::Unreachable(kind))
                    }
                    Err(e) => Err(e),
                }
            })
            .await?;

        let tasks = self
            .tasks
            .get_or_init(|| async { Arc::new(TaskExecutor::start(store.clone())) })
            .await
            .clone();

        let state = AppState::new(self.config.clone(), store.clone(), tasks, availability);
        if !availability.is_available() {
            return Ok(state);
        }

        if self.config.profiler.enabled {
            Profiler::initialize_for(&store, REDACTED_FIELDS, self.config.profiler.capacity);
        }

        info!("Started Raccoon Blog");
        debug!(binders = ?binders::registered_binders(), "Model binders registered");
        debug!(mappings = ?mapping::registered_mappings(), "Object mappings configured");

        seed_default_configuration(&store)
            .await
            .map_err(StartupError::Seed)?;

        Ok(state)
    }

    async fn initialize_store(&self) -> Result<Arc<DocumentStore>, StartupError> {
        let name = self.config.store.connection_name.clone();
        let raw = self.config.connection_string()?;
        let connection: ConnectionString = raw
            .parse()
            .map_err(|source| StartupError::ConnectionString { name, source })?;

        let store = DocumentStore::initialize(connection, self.connector.as_ref())
            .await
            .map_err(StartupError::Store)?;
        Ok(Arc::new(store))
    }
}
