//! Unified error handling system
//!
//! Provides structured error types with context and recovery suggestions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type RaccoonResult<T> = Result<T, RaccoonError>;

/// Error context providing additional information for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Unique error ID for tracking
    pub error_id: String,
    /// Timestamp when error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where error originated
    pub component: String,
    /// Operation being performed when error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            error_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type for configuration and process-level failures
#[derive(Error, Debug)]
pub enum RaccoonError {
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
        context: ErrorContext,
    },

    #[error("Logging setup error: {message}")]
    Logging {
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RaccoonError {
    /// Get the error context
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            RaccoonError::Config { context, .. } => Some(context),
            RaccoonError::Validation { context, .. } => Some(context),
            RaccoonError::Logging { context, .. } => Some(context),
            RaccoonError::Io(_) => None,
        }
    }
}

#[macro_export]
macro_rules! config_error {
    ($msg:expr, $operation:expr) => {
        $crate::RaccoonError::Config {
            message: $msg.to_string(),
            source: None,
            context: $crate::ErrorContext::new("config")
                .with_operation($operation)
                .with_suggestion("Check your raccoon.toml"),
        }
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr, $field:expr) => {
        $crate::RaccoonError::Validation {
            message: $msg.to_string(),
            field: Some($field.to_string()),
            context: $crate::ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Check the field value and format"),
        }
    };
}
