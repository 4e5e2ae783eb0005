//! Raccoon Blog web server
//!
//! Runs startup, binds the listener and serves the app until Ctrl-C.

use crate::startup::Bootstrapper;
use crate::{create_app, AppState, StoreAvailability, WebError, WebResult};
use axum::serve;
use raccoon_core::RaccoonConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Main Raccoon Blog web server
pub struct RaccoonServer {
    config: RaccoonConfig,
    state: AppState,
}

impl RaccoonServer {
    /// Run startup against the configured store
    pub async fn new(config: RaccoonConfig) -> WebResult<Self> {
        let bootstrapper = Bootstrapper::new(config.clone());
        let state = bootstrapper.start().await?;
        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting Raccoon Blog web server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", self.config.server.dev_mode);
        info!("Document store: {}", self.state.store.connection().redacted());
        if let StoreAvailability::Unreachable(kind) = self.state.availability {
            warn!("Database unreachable ({}), every request is redirected", kind);
        }

        let app = create_app(self.state.clone());
        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        let result = serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        self.state.tasks.shutdown().await;

        if let Err(e) = result {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        info!("Server shut down gracefully");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &RaccoonConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Builder for RaccoonServer
pub struct RaccoonServerBuilder {
    config: RaccoonConfig,
}

impl RaccoonServerBuilder {
    pub fn new() -> Self {
        Self {
            config: RaccoonConfig::default(),
        }
    }

    pub fn from_config(config: RaccoonConfig) -> Self {
        Self { config }
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    /// Set the connection string the store is initialized from
    pub fn connection_string<S: Into<String>>(mut self, connection: S) -> Self {
        let name = self.config.store.connection_name.clone();
        self.config.connection_strings.insert(name, connection.into());
        self
    }

    /// Run startup and build the server
    pub async fn build(self) -> WebResult<RaccoonServer> {
        RaccoonServer::new(self.config).await
    }
}

impl Default for RaccoonServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
