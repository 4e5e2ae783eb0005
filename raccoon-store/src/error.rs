//! Store error types
//!
//! Transport failures are kept apart from every other failure so callers can tell
//! "the database is not reachable" from "the database said no".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Socket-level failure kinds for calls that never got a reply from the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportErrorKind {
    AddressNotAvailable,
    NetworkDown,
    NetworkUnreachable,
    ConnectionAborted,
    ConnectionReset,
    TimedOut,
    ConnectionRefused,
    HostDown,
    HostUnreachable,
    HostNotFound,
    AccessDenied,
    Other,
}

impl TransportErrorKind {
    /// Whether the failure means the database server could not be reached at all
    pub fn is_unreachable(&self) -> bool {
        match self {
            TransportErrorKind::AddressNotAvailable
            | TransportErrorKind::NetworkDown
            | TransportErrorKind::NetworkUnreachable
            | TransportErrorKind::ConnectionAborted
            | TransportErrorKind::ConnectionReset
            | TransportErrorKind::TimedOut
            | TransportErrorKind::ConnectionRefused
            | TransportErrorKind::HostDown
            | TransportErrorKind::HostUnreachable
            | TransportErrorKind::HostNotFound => true,
            TransportErrorKind::AccessDenied | TransportErrorKind::Other => false,
        }
    }

    pub fn from_io_kind(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::AddrNotAvailable => TransportErrorKind::AddressNotAvailable,
            io::ErrorKind::NetworkDown => TransportErrorKind::NetworkDown,
            io::ErrorKind::NetworkUnreachable => TransportErrorKind::NetworkUnreachable,
            io::ErrorKind::ConnectionAborted => TransportErrorKind::ConnectionAborted,
            io::ErrorKind::ConnectionReset => TransportErrorKind::ConnectionReset,
            io::ErrorKind::TimedOut => TransportErrorKind::TimedOut,
            io::ErrorKind::ConnectionRefused => TransportErrorKind::ConnectionRefused,
            io::ErrorKind::HostUnreachable => TransportErrorKind::HostUnreachable,
            io::ErrorKind::PermissionDenied => TransportErrorKind::AccessDenied,
            _ => TransportErrorKind::Other,
        }
    }

    /// Classify a socket error, using the OS error code where `io::ErrorKind` has no match
    pub fn from_io_error(err: &io::Error) -> Self {
        match err.raw_os_error() {
            Some(code) if code == EHOSTDOWN => TransportErrorKind::HostDown,
            _ => Self::from_io_kind(err.kind()),
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const EHOSTDOWN: i32 = 112;
#[cfg(any(target_os = "macos", target_os = "ios", target_os = "freebsd"))]
const EHOSTDOWN: i32 = 64;
#[cfg(windows)]
const EHOSTDOWN: i32 = 10064;
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    windows
)))]
const EHOSTDOWN: i32 = -1;

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid connection string: {message}")]
    InvalidConnectionString { message: String },

    #[error("Could not reach the database ({kind}): {message}")]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Database server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid index definition {index}: {message}")]
    InvalidIndex { index: String, message: String },

    #[error("Document {id} could not be read: {source}")]
    Deserialize {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        StoreError::Transport {
            kind,
            message: message.into(),
        }
    }

    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            StoreError::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        self.transport_kind()
            .map(|kind| kind.is_unreachable())
            .unwrap_or(false)
    }
}

/// Walk a source chain looking for the socket error underneath
fn find_io_error<'a>(err: &'a (dyn std::error::Error + 'static)) -> Option<&'a io::Error> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err);
        }
        current = e.source();
    }
    None
}

/// Whether a resolver failure sits anywhere in the source chain
fn is_dns_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let message = e.to_string();
        if message.starts_with("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        current = e.source();
    }
    false
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return StoreError::Server {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }

        if err.is_timeout() {
            return StoreError::transport(TransportErrorKind::TimedOut, err.to_string());
        }

        // Resolver errors come wrapped in an uncategorized io::Error, check them first
        if err.is_connect() && is_dns_failure(&err) {
            return StoreError::transport(TransportErrorKind::HostNotFound, err.to_string());
        }

        if let Some(io_err) = find_io_error(&err) {
            return StoreError::transport(TransportErrorKind::from_io_error(io_err), err.to_string());
        }

        if err.is_connect() {
            return StoreError::transport(TransportErrorKind::Other, err.to_string());
        }

        StoreError::Database {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(io_err) => StoreError::transport(
                TransportErrorKind::from_io_error(&io_err),
                io_err.to_string(),
            ),
            sqlx::Error::PoolTimedOut => {
                StoreError::transport(TransportErrorKind::TimedOut, "connection pool timed out")
            }
            other => StoreError::Database {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listed_kinds_are_unreachable() {
        let listed = [
            TransportErrorKind::AddressNotAvailable,
            TransportErrorKind::NetworkDown,
            TransportErrorKind::NetworkUnreachable,
            TransportErrorKind::ConnectionAborted,
            TransportErrorKind::ConnectionReset,
            TransportErrorKind::TimedOut,
            TransportErrorKind::ConnectionRefused,
            TransportErrorKind::HostDown,
            TransportErrorKind::HostUnreachable,
            TransportErrorKind::HostNotFound,
        ];
        assert!(listed.iter().all(|kind| kind.is_unreachable()));
        assert!(!TransportErrorKind::AccessDenied.is_unreachable());
        assert!(!TransportErrorKind::Other.is_unreachable());
    }

    #[test]
    fn test_io_kinds_map_to_transport_kinds() {
        assert_eq!(
            TransportErrorKind::from_io_kind(io::ErrorKind::ConnectionRefused),
            TransportErrorKind::ConnectionRefused
        );
        assert_eq!(
            TransportErrorKind::from_io_kind(io::ErrorKind::PermissionDenied),
            TransportErrorKind::AccessDenied
        );
        assert_eq!(
            TransportErrorKind::from_io_kind(io::ErrorKind::InvalidData),
            TransportErrorKind::Other
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_os_codes_without_io_kind_are_classified() {
        let host_down = io::Error::from_raw_os_error(112);
        assert_eq!(
            TransportErrorKind::from_io_error(&host_down),
            TransportErrorKind::HostDown
        );

        let refused = io::Error::from_raw_os_error(111);
        assert_eq!(
            TransportErrorKind::from_io_error(&refused),
            TransportErrorKind::ConnectionRefused
        );
    }

    #[test]
    fn test_resolver_failure_in_source_chain() {
        let lookup = io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Name or service not known",
        );
        assert!(is_dns_failure(&lookup));

        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert!(!is_dns_failure(&refused));
    }

    #[test]
    fn test_only_transport_errors_report_unreachable() {
        let refused = StoreError::transport(TransportErrorKind::ConnectionRefused, "refused");
        assert!(refused.is_unreachable());

        let denied = StoreError::transport(TransportErrorKind::AccessDenied, "denied");
        assert!(!denied.is_unreachable());

        let server = StoreError::Server {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!server.is_unreachable());
        assert_eq!(server.transport_kind(), None);
    }
}
