//! Host configuration
//!
//! Loaded from a TOML file, then overridden from the environment and the command line.

use crate::error::{ErrorContext, RaccoonError, RaccoonResult};
use crate::logging::LoggingConfig;
use crate::{config_error, validation_error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the connection string the store is initialized from unless configured otherwise
pub const DEFAULT_CONNECTION_NAME: &str = "RavenDB";

/// Top-level configuration for the blog host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaccoonConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    /// Named connection strings, RavenDB style (`Url=...;Database=...`)
    pub connection_strings: BTreeMap<String, String>,
    pub profiler: ProfilerConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub dev_mode: bool,
    /// Maximum accepted request body in bytes
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which entry of `connection_strings` to connect with
    pub connection_name: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    pub enabled: bool,
    /// Number of captured store requests kept in memory
    pub capacity: usize,
}

impl Default for RaccoonConfig {
    fn default() -> Self {
        let mut connection_strings = BTreeMap::new();
        connection_strings.insert(
            DEFAULT_CONNECTION_NAME.to_string(),
            "RunInMemory=true".to_string(),
        );

        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            connection_strings,
            profiler: ProfilerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            dev_mode: false,
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_name: DEFAULT_CONNECTION_NAME.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 256,
        }
    }
}

impl RaccoonConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> RaccoonResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RaccoonError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> RaccoonResult<Self> {
        toml::from_str(content).map_err(|e| RaccoonError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> RaccoonResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| RaccoonError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| RaccoonError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// Apply `RACCOON_*` environment overrides
    pub fn apply_env_overrides(&mut self) -> RaccoonResult<()> {
        if let Ok(host) = std::env::var("RACCOON_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("RACCOON_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| validation_error!(format!("Invalid port: {}", port), "RACCOON_PORT"))?;
        }

        if let Ok(connection) = std::env::var("RACCOON_CONNECTION_STRING") {
            self.connection_strings
                .insert(self.store.connection_name.clone(), connection);
        }

        Ok(())
    }

    /// Resolve the connection string the store should be initialized from
    pub fn connection_string(&self) -> RaccoonResult<&str> {
        let name = &self.store.connection_name;
        match self.connection_strings.get(name) {
            Some(value) if !value.trim().is_empty() => Ok(value.as_str()),
            Some(_) => Err(config_error!(
                format!("Connection string '{}' is empty", name),
                "connection_string"
            )),
            None => Err(config_error!(
                format!("Connection string '{}' is not configured", name),
                "connection_string"
            )),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration
    pub fn validate(&self) -> RaccoonResult<()> {
        if self.server.host.is_empty() {
            return Err(validation_error!("Host cannot be empty", "server.host"));
        }

        if self.server.body_limit_bytes == 0 {
            return Err(validation_error!(
                "Body limit must be greater than 0",
                "server.body_limit_bytes"
            ));
        }

        if self.store.request_timeout_secs == 0 {
            return Err(validation_error!(
                "Store request timeout must be greater than 0",
                "store.request_timeout_secs"
            ));
        }

        if self.profiler.enabled && self.profiler.capacity == 0 {
            return Err(validation_error!(
                "Profiler capacity must be greater than 0 when profiling is enabled",
                "profiler.capacity"
            ));
        }

        self.connection_string()?;
        Ok(())
    }
}
