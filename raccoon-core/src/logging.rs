//! Logging setup
//!
//! Structured logging through `tracing-subscriber` with a configurable output format

use crate::error::{ErrorContext, RaccoonError, RaccoonResult};
use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Whether to include file and line information
    pub include_location: bool,
    /// Whether to include thread information
    pub include_thread: bool,
    /// Log file path; stdout when unset
    pub log_file_path: Option<String>,
    /// Emit a line when spans close, carrying their duration
    pub log_span_timings: bool,
    /// Custom filter directives
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_file_path: None,
            log_span_timings: false,
            filter_directives: vec![
                "raccoon_web=debug".to_string(),
                "raccoon_store=debug".to_string(),
                "tower_http=info".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    /// Build the env filter: a non-empty `RUST_LOG` replaces the configured level and directives
    pub fn env_filter(&self) -> RaccoonResult<EnvFilter> {
        let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
        self.filter_from(rust_log.as_deref())
    }

    fn filter_from(&self, rust_log: Option<&str>) -> RaccoonResult<EnvFilter> {
        if let Some(spec) = rust_log.filter(|s| !s.trim().is_empty()) {
            return EnvFilter::try_new(spec).map_err(|e| RaccoonError::Logging {
                message: format!("Invalid RUST_LOG '{}': {}", spec, e),
                context: ErrorContext::new("logging").with_operation("parse_env"),
            });
        }

        let mut filter = EnvFilter::new(&self.level);
        for directive in &self.filter_directives {
            let directive = directive.parse().map_err(|e| RaccoonError::Logging {
                message: format!("Invalid filter directive '{}': {}", directive, e),
                context: ErrorContext::new("logging").with_operation("parse_directive"),
            })?;
            filter = filter.add_directive(directive);
        }

        Ok(filter)
    }
}

/// Initialize the logging system
pub fn init_logging(config: &LoggingConfig) -> RaccoonResult<()> {
    let filter = config.env_filter()?;

    let span_events = if config.log_span_timings {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let base = fmt::layer()
        .with_span_events(span_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread)
        .with_thread_names(config.include_thread);

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match &config.log_file_path {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;
            let base = base.with_writer(std::sync::Mutex::new(file)).with_ansi(false);
            match config.format {
                LogFormat::Json => base.json().boxed(),
                LogFormat::Pretty => base.pretty().boxed(),
                LogFormat::Compact => base.compact().boxed(),
            }
        }
        None => {
            let base = base.with_writer(io::stdout);
            match config.format {
                LogFormat::Json => base.json().boxed(),
                LogFormat::Pretty => base.pretty().boxed(),
                LogFormat::Compact => base.compact().boxed(),
            }
        }
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| RaccoonError::Logging {
            message: format!("Failed to install subscriber: {}", e),
            context: ErrorContext::new("logging").with_operation("init"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_deserializes_lowercase() {
        let config: LoggingConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_invalid_directive_is_rejected() {
        let config = LoggingConfig {
            filter_directives: vec!["raccoon_web=verbose".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            config.filter_from(None),
            Err(RaccoonError::Logging { .. })
        ));
    }

    #[test]
    fn test_rust_log_replaces_configured_directives() {
        let config = LoggingConfig::default();

        let configured = config.filter_from(None).unwrap().to_string();
        assert!(configured.contains("raccoon_web=debug"));

        let from_env = config.filter_from(Some("warn")).unwrap().to_string();
        assert_eq!(from_env, "warn");

        let blank = config.filter_from(Some("  ")).unwrap().to_string();
        assert!(blank.contains("raccoon_web=debug"));
    }
}
